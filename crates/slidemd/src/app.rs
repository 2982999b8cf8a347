use eframe::egui;
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::deck::FragmentContent;
use crate::frontmatter::DEFAULT_THEME;
use crate::navigator::NavKey;
use crate::remote::{HashStore, StaticSource};
use crate::render::{self, text};
use crate::session::{
    self, INFO_DOCUMENT_NAME, Location, Mode, PLACEHOLDER, RequestTicket, Session,
};
use crate::theme::{self, Palette, StyleVars, ThemeSource};

const TOAST_DURATION: f32 = 1.5;
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

/// What the viewer opens on.
pub enum Source {
    File(PathBuf),
    Url(String),
    Default,
}

pub struct Options {
    pub source: Source,
    pub windowed: bool,
    pub edit: bool,
    pub offline: bool,
}

/// Results of background work, delivered to the UI thread.
enum Message {
    Loaded {
        ticket: RequestTicket,
        content: String,
    },
    Theme {
        name: String,
        vars: Option<StyleVars>,
    },
    Shared(Result<String, String>),
    FileChanged,
}

struct Services {
    store: Arc<dyn HashStore>,
    statics: Arc<dyn StaticSource>,
    themes: Arc<dyn ThemeSource>,
}

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let fade_start = 1.0;
        if elapsed < fade_start {
            1.0
        } else if elapsed < TOAST_DURATION {
            1.0 - (elapsed - fade_start) / (TOAST_DURATION - fade_start)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= TOAST_DURATION
    }
}

struct ViewerApp {
    session: Session,
    location: Location,
    file: Option<PathBuf>,
    services: Services,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    ctx: egui::Context,
    palette: Palette,
    palette_generation: Option<u64>,
    editor: String,
    toast: Option<Toast>,
    theme_in_flight: Option<String>,
    share_in_flight: bool,
    _watcher: Option<Debouncer<RecommendedWatcher>>,
}

impl ViewerApp {
    fn new(
        ctx: egui::Context,
        session: Session,
        location: Location,
        file: Option<PathBuf>,
        services: Services,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let editor = session.content().to_string();
        Self {
            session,
            location,
            file,
            services,
            tx,
            rx,
            ctx,
            palette: Palette::default(),
            palette_generation: None,
            editor,
            toast: None,
            theme_in_flight: None,
            share_in_flight: false,
            _watcher: None,
        }
    }

    /// Run `job` on a worker thread and deliver its message.
    fn spawn(&self, job: impl FnOnce() -> Message + Send + 'static) {
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        std::thread::spawn(move || {
            if tx.send(job()).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    fn load_file(&mut self) {
        let Some(path) = self.file.clone() else {
            return;
        };
        let ticket = self.session.begin_request();
        self.spawn(move || Message::Loaded {
            ticket,
            content: read_or_placeholder(&path),
        });
    }

    fn load_location(&mut self) {
        let ticket = self.session.begin_request();
        let location = self.location.clone();
        let store = Arc::clone(&self.services.store);
        let statics = Arc::clone(&self.services.statics);
        self.spawn(move || Message::Loaded {
            ticket,
            content: session::resolve_location(&location, store.as_ref(), statics.as_ref()),
        });
    }

    fn load_info(&mut self) {
        let ticket = self.session.begin_request();
        let statics = Arc::clone(&self.services.statics);
        self.spawn(move || Message::Loaded {
            ticket,
            content: session::load_static(statics.as_ref(), INFO_DOCUMENT_NAME),
        });
    }

    fn share(&mut self) {
        if self.share_in_flight {
            return;
        }
        self.commit_editor();
        self.share_in_flight = true;
        let content = self.session.content().to_string();
        let location = self.location.clone();
        let store = Arc::clone(&self.services.store);
        self.spawn(move || {
            Message::Shared(
                session::share_link(&content, &location, store.as_ref()).map_err(|e| e.to_string()),
            )
        });
    }

    /// Re-read the watched file when it changes on disk.
    fn watch_file(&mut self) {
        let Some(path) = self.file.clone() else {
            return;
        };
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        let target = path.clone();
        let handler = move |result: DebounceEventResult| match result {
            Ok(events) => {
                if events.iter().any(|e| e.path == target)
                    && tx.send(Message::FileChanged).is_ok()
                {
                    ctx.request_repaint();
                }
            }
            Err(e) => tracing::warn!("file watch error: {e}"),
        };

        let watched = path.parent().unwrap_or(Path::new("."));
        match new_debouncer(RELOAD_DEBOUNCE, handler) {
            Ok(mut debouncer) => {
                if let Err(e) = debouncer.watcher().watch(watched, RecursiveMode::NonRecursive) {
                    tracing::warn!(path = %watched.display(), "cannot watch for changes: {e}");
                    return;
                }
                tracing::info!(path = %path.display(), "watching for changes");
                self._watcher = Some(debouncer);
            }
            Err(e) => tracing::warn!("cannot start file watcher: {e}"),
        }
    }

    /// Leaving the editor installs what was typed.
    fn commit_editor(&mut self) {
        if self.session.mode() == Mode::Edit && self.editor != self.session.content() {
            self.session.set_content(self.editor.clone());
        }
    }

    fn toggle_mode(&mut self) {
        if self.session.mode() == Mode::Edit {
            self.commit_editor();
        } else {
            self.editor = self.session.content().to_string();
        }
        self.session.toggle_mode();
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Loaded { ticket, content } => {
                if self.session.finish_request(ticket, content) {
                    self.editor = self.session.content().to_string();
                }
            }
            Message::Theme { name, vars } => {
                if self.theme_in_flight.as_deref() == Some(name.as_str()) {
                    self.theme_in_flight = None;
                }
                if !self.session.apply_theme(&name, vars) {
                    tracing::debug!(theme = name, "dropping stale theme");
                }
            }
            Message::Shared(result) => {
                self.share_in_flight = false;
                match result {
                    Ok(link) => {
                        tracing::info!(link, "share link created");
                        self.ctx.copy_text(link);
                        self.toast = Some(Toast::new("Copied!"));
                    }
                    Err(e) => {
                        tracing::warn!("share failed: {e}");
                        self.toast = Some(Toast::new("Sharing failed"));
                    }
                }
            }
            Message::FileChanged => {
                if self.session.mode() == Mode::Edit {
                    tracing::debug!("file changed while editing; keeping the editor");
                } else {
                    self.load_file();
                }
            }
        }
    }

    /// Fetch the theme the document needs, once per name.
    fn request_theme(&mut self) {
        let Some(name) = self.session.pending_theme().map(str::to_string) else {
            return;
        };
        if self.theme_in_flight.as_deref() == Some(name.as_str()) {
            return;
        }
        self.theme_in_flight = Some(name.clone());
        let themes = Arc::clone(&self.services.themes);
        self.spawn(move || Message::Theme {
            vars: theme::resolve_theme(themes.as_ref(), &name),
            name,
        });
    }

    fn sync_palette(&mut self) {
        let generation = self.session.style().generation();
        if self.palette_generation != Some(generation) {
            self.palette = Palette::from_vars(self.session.style().vars());
            self.palette_generation = Some(generation);
        }
    }

    fn draw_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = match self.session.mode() {
                    Mode::View => "Edit",
                    Mode::Edit => "View",
                };
                if ui.button(label).clicked() {
                    self.toggle_mode();
                }
                if ui
                    .add_enabled(!self.share_in_flight, egui::Button::new("Share"))
                    .clicked()
                {
                    self.share();
                }
                if ui.button("Info").clicked() {
                    self.load_info();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let nav = self.session.navigator();
                    if let Some(index) = nav.current() {
                        ui.label(format!("{} / {}", index + 1, nav.len()));
                    }
                });
            });
        });
    }

    fn draw_links(&self, ctx: &egui::Context) {
        let deck = self.session.deck();
        let Some(fragment) = self
            .session
            .navigator()
            .current()
            .and_then(|i| deck.fragments.get(i))
        else {
            return;
        };
        let urls: Vec<&str> = match &fragment.content {
            FragmentContent::Text { lines } => text::link_targets(lines),
            FragmentContent::Image { url } => vec![url.as_str()],
        };
        if urls.is_empty() {
            return;
        }
        egui::TopBottomPanel::bottom("links").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                for url in urls {
                    ui.add(egui::Hyperlink::new(url).open_in_new_tab(true));
                }
            });
        });
    }

    fn draw_view(&self, ui: &egui::Ui) {
        let rect = ui.max_rect();
        let scale = render::compute_scale(rect);
        let deck = self.session.deck();
        ui.painter().rect_filled(rect, 0.0, self.palette.background);
        if let Some(fragment) = self
            .session
            .navigator()
            .current()
            .and_then(|i| deck.fragments.get(i))
        {
            render::render_fragment(ui, deck, fragment, &self.palette, rect, scale);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let messages: Vec<Message> = self.rx.try_iter().collect();
        for message in messages {
            self.handle(message);
        }
        self.request_theme();
        self.sync_palette();

        // Viewport commands are sent after the input closure; sending inside
        // it deadlocks.
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();
        let mut keys: Vec<NavKey> = Vec::new();
        let viewing = self.session.mode() == Mode::View;
        let mut toggle = false;
        ctx.input(|i| {
            if i.modifiers.command && i.key_pressed(egui::Key::E) {
                toggle = true;
                return;
            }
            if !viewing {
                return;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                keys.push(NavKey::ArrowRight);
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                keys.push(NavKey::ArrowLeft);
            }
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
            }
            if i.key_pressed(egui::Key::F) {
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                    !i.viewport().fullscreen.unwrap_or(false),
                ));
            }
        });
        if toggle {
            self.toggle_mode();
        }
        for key in keys {
            self.session.handle_key(key);
        }
        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }

        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        self.draw_toolbar(ctx);

        match self.session.mode() {
            Mode::View => {
                self.draw_links(ctx);
                egui::CentralPanel::default()
                    .frame(egui::Frame::new().fill(self.palette.background).inner_margin(0.0))
                    .show(ctx, |ui| {
                        self.draw_view(ui);
                        if let Some(toast) = &self.toast {
                            draw_toast(ui, ctx, toast, &self.palette);
                        }
                    });
            }
            Mode::Edit => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.add_sized(
                            ui.available_size(),
                            egui::TextEdit::multiline(&mut self.editor)
                                .code_editor()
                                .desired_width(f32::INFINITY),
                        );
                    });
                    if let Some(toast) = &self.toast {
                        draw_toast(ui, ctx, toast, &self.palette);
                    }
                });
            }
        }
    }
}

fn draw_toast(ui: &egui::Ui, ctx: &egui::Context, toast: &Toast, palette: &Palette) {
    let opacity = toast.opacity();
    if opacity <= 0.0 {
        return;
    }
    let rect = ui.max_rect();
    let scale = render::compute_scale(rect).max(0.6);
    let toast_color = Palette::with_opacity(palette.foreground, opacity * 0.9);
    let toast_bg = Palette::with_opacity(palette.code_background, opacity * 0.9);
    let galley = ui.painter().layout_no_wrap(
        toast.message.clone(),
        egui::FontId::proportional(20.0 * scale),
        toast_color,
    );
    let padding = 16.0 * scale;
    let toast_rect = egui::Rect::from_min_size(
        egui::pos2(
            rect.center().x - galley.rect.width() / 2.0 - padding,
            rect.bottom() - 80.0 * scale,
        ),
        egui::vec2(
            galley.rect.width() + padding * 2.0,
            galley.rect.height() + padding * 2.0,
        ),
    );
    ui.painter().rect_filled(toast_rect, 8.0 * scale, toast_bg);
    let text_pos = egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding);
    ui.painter().galley(text_pos, galley, toast_color);
    ctx.request_repaint();
}

fn read_or_placeholder(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "failed to read document: {e}");
        PLACEHOLDER.to_string()
    })
}

/// Where the viewer starts and which origin it may ask for remote documents
/// and themes.
struct Launch {
    location: Location,
    file: Option<PathBuf>,
    title: String,
    remote_origin: Option<String>,
    opened_url: bool,
}

fn launch(source: Source, config: &Config) -> anyhow::Result<Launch> {
    let launch = match source {
        Source::File(path) => {
            let path = path.canonicalize().unwrap_or(path);
            let title = format!(
                "slidemd - {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );
            Launch {
                location: Location::at_origin(config.origin()),
                file: Some(path),
                title,
                remote_origin: config.configured_origin().map(str::to_string),
                opened_url: false,
            }
        }
        Source::Url(url) => {
            let location = Location::parse(&url)
                .map_err(|e| anyhow::anyhow!("Invalid URL {url}: {e}"))?;
            Launch {
                remote_origin: Some(location.origin().to_string()),
                location,
                file: None,
                title: "slidemd".to_string(),
                opened_url: true,
            }
        }
        Source::Default => Launch {
            location: Location::at_origin(config.origin()),
            file: None,
            title: "slidemd".to_string(),
            remote_origin: config.configured_origin().map(str::to_string),
            opened_url: false,
        },
    };
    Ok(launch)
}

pub fn run(options: Options) -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let mode = if options.edit {
        Mode::Edit
    } else {
        config.start_mode()
    };
    let session =
        Session::new(mode).with_default_theme(config.default_theme().unwrap_or(DEFAULT_THEME));

    let Launch {
        location,
        file,
        title,
        remote_origin,
        opened_url,
    } = launch(options.source, &config)?;
    let services = Services {
        store: Arc::from(config.store()),
        statics: Arc::from(Config::static_source(remote_origin.as_deref(), options.offline)),
        themes: Arc::new(config.theme_source_at(remote_origin.as_deref(), options.offline)),
    };

    let viewport = if options.windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| {
            let mut app = ViewerApp::new(cc.egui_ctx.clone(), session, location, file, services);
            if app.file.is_some() {
                app.load_file();
                app.watch_file();
            } else if opened_url {
                app.load_location();
            } else {
                app.load_info();
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
