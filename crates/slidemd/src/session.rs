//! The editing session: one document, its rendered deck, navigation, style,
//! and the view/edit mode. Also the URL rules for loading and sharing.

use crate::codec;
use crate::deck::Deck;
use crate::frontmatter::DEFAULT_THEME;
use crate::navigator::{KeyBinding, NavKey, Navigator, Subscription};
use crate::remote::{FetchError, HashStore, StaticSource};
use crate::theme::{StyleContext, StyleVars, ThemeSource};

/// Static document shown when a URL names neither a key nor a token.
pub const INFO_DOCUMENT_NAME: &str = "info.md";

/// Shown whenever content cannot be loaded.
pub const PLACEHOLDER: &str = "Unable to\nload\ncontent 😢";

pub const INITIAL_CONTENT: &str = "🐢";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    View,
    Edit,
}

impl Mode {
    pub fn from_name(name: &str) -> Self {
        match name {
            "edit" => Self::Edit,
            _ => Self::View,
        }
    }
}

/// Where the viewer was opened: the first path segment is a hash-store key,
/// the fragment an inline share token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    origin: String,
    key: Option<String>,
    token: Option<String>,
}

impl Location {
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        let parsed = url::Url::parse(url)?;
        let key = parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string);
        let token = parsed
            .fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string);
        Ok(Self {
            origin: parsed.origin().ascii_serialization(),
            key,
            token,
        })
    }

    /// A location with neither key nor token.
    pub fn at_origin(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            key: None,
            token: None,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn with_token(&self, token: &str) -> String {
        format!("{}/#{token}", self.origin)
    }

    pub fn with_key(&self, key: &str) -> String {
        format!("{}/{key}", self.origin)
    }
}

/// Load the document a location points at.
///
/// A token that decodes to content wins and the key is never fetched.
/// Otherwise the key is looked up; a store failure shows the placeholder.
/// With nothing usable the static info document is loaded.
pub fn resolve_location(
    location: &Location,
    store: &dyn HashStore,
    statics: &dyn StaticSource,
) -> String {
    if let Some(token) = location.token() {
        let content = codec::decode(token);
        if !content.is_empty() {
            return content;
        }
        tracing::info!("share token in URL fragment did not decode");
    }

    if let Some(key) = location.key() {
        match store.get(key) {
            Ok(token) => {
                let content = codec::decode(&token);
                if !content.is_empty() {
                    return content;
                }
                tracing::warn!(key, "stored token did not decode");
            }
            Err(e) => {
                tracing::warn!(key, "failed to load shared document: {e}");
                return PLACEHOLDER.to_string();
            }
        }
    }

    load_static(statics, INFO_DOCUMENT_NAME)
}

/// Load a static document, falling back to the placeholder.
pub fn load_static(statics: &dyn StaticSource, name: &str) -> String {
    statics.load(name).unwrap_or_else(|e| {
        tracing::warn!(name, "failed to load static document: {e}");
        PLACEHOLDER.to_string()
    })
}

/// A URL that reproduces `content`. Locations that already carry a token get
/// a new inline token; otherwise the token is stored and its key linked.
pub fn share_link(
    content: &str,
    location: &Location,
    store: &dyn HashStore,
) -> Result<String, FetchError> {
    let token = codec::encode(content);
    if location.token().is_some() {
        return Ok(location.with_token(&token));
    }
    let key = store.add(&token)?;
    Ok(location.with_key(&key))
}

/// Tag for an in-flight load. Only the latest ticket may install content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

pub struct Session {
    content: String,
    deck: Deck,
    navigator: Navigator,
    style: StyleContext,
    mode: Mode,
    keys: KeyBinding,
    subscription: Option<Subscription>,
    generation: u64,
    default_theme: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Mode::View)
    }
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        let deck = Deck::parse(INITIAL_CONTENT);
        let mut session = Self {
            content: INITIAL_CONTENT.to_string(),
            navigator: Navigator::new(deck.len()),
            deck,
            style: StyleContext::new(),
            mode: Mode::Edit,
            keys: KeyBinding::default(),
            subscription: None,
            generation: 0,
            default_theme: DEFAULT_THEME.to_string(),
        };
        session.set_mode(mode);
        session
    }

    /// Theme used for documents that do not name one.
    pub fn with_default_theme(mut self, theme: impl Into<String>) -> Self {
        self.default_theme = theme.into();
        self
    }

    /// Theme the current document resolves to.
    pub fn theme(&self) -> &str {
        self.deck.frontmatter.theme_or(&self.default_theme)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn style(&self) -> &StyleContext {
        &self.style
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Replace the document. Supersedes any load still in flight.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.generation += 1;
        self.install(content.into());
    }

    fn install(&mut self, content: String) {
        self.deck = Deck::parse(&content);
        self.content = content;
        self.navigator.reset(self.deck.len());
        tracing::debug!(fragments = self.deck.len(), "document replaced");
    }

    /// Start a load; its result is only accepted if nothing newer started.
    pub fn begin_request(&mut self) -> RequestTicket {
        self.generation += 1;
        RequestTicket(self.generation)
    }

    /// Install the result of a load. Returns `false` for a stale ticket.
    pub fn finish_request(&mut self, ticket: RequestTicket, content: String) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.generation,
                "dropping stale response"
            );
            return false;
        }
        self.install(content);
        true
    }

    /// Theme that has to be (re)loaded for the current document, if any.
    pub fn pending_theme(&self) -> Option<&str> {
        let theme = self.theme();
        self.style
            .needs_refresh(theme, &self.deck.frontmatter)
            .then_some(theme)
    }

    /// Apply a loaded theme. Ignored when the document has moved on to
    /// another theme meanwhile.
    pub fn apply_theme(&mut self, theme: &str, base: Option<StyleVars>) -> bool {
        if self.theme() != theme {
            return false;
        }
        self.style.apply(theme, base, &self.deck.frontmatter);
        true
    }

    /// Resolve the pending theme synchronously.
    pub fn refresh_style(&mut self, source: &dyn ThemeSource) {
        if let Some(theme) = self.pending_theme().map(str::to_string) {
            self.style
                .refresh(source, &theme, &self.deck.frontmatter);
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        match mode {
            Mode::View => self.subscription = Some(self.keys.subscribe()),
            Mode::Edit => {
                if let Some(subscription) = self.subscription.take() {
                    self.keys.unsubscribe(subscription);
                }
            }
        }
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            Mode::View => Mode::Edit,
            Mode::Edit => Mode::View,
        };
        self.set_mode(next);
    }

    /// Route a key press to navigation. Only view mode listens.
    pub fn handle_key(&mut self, key: NavKey) -> bool {
        self.keys
            .dispatch(key)
            .is_some_and(|command| self.navigator.apply(command))
    }

    pub fn share_link(
        &self,
        location: &Location,
        store: &dyn HashStore,
    ) -> Result<String, FetchError> {
        share_link(&self.content, location, store)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::remote::testing::{MemoryStatic, MemoryStore};
    use crate::theme::BuiltinThemes;

    fn statics() -> MemoryStatic {
        MemoryStatic(HashMap::from([(
            INFO_DOCUMENT_NAME.to_string(),
            "info\n\npage".to_string(),
        )]))
    }

    #[test]
    fn test_location_parts() {
        let loc = Location::parse("https://slides.example.org/abc123/extra#TOKEN").unwrap();
        assert_eq!(loc.origin(), "https://slides.example.org");
        assert_eq!(loc.key(), Some("abc123"));
        assert_eq!(loc.token(), Some("TOKEN"));

        let bare = Location::parse("http://localhost:3000/").unwrap();
        assert_eq!(bare.origin(), "http://localhost:3000");
        assert_eq!(bare.key(), None);
        assert_eq!(bare.token(), None);
        assert!(Location::parse("not a url").is_err());
    }

    #[test]
    fn test_token_wins_over_key() {
        let store = MemoryStore::default();
        let key = store.add(&codec::encode("from key")).unwrap();
        let url = format!("https://s.example/{key}#{}", codec::encode("from token"));
        let loc = Location::parse(&url).unwrap();
        assert_eq!(resolve_location(&loc, &store, &statics()), "from token");
    }

    #[test]
    fn test_bad_token_falls_back_to_key() {
        let store = MemoryStore::default();
        let key = store.add(&codec::encode("from key")).unwrap();
        let loc = Location::parse(&format!("https://s.example/{key}#garbage!")).unwrap();
        assert_eq!(resolve_location(&loc, &store, &statics()), "from key");
    }

    #[test]
    fn test_key_failure_shows_placeholder() {
        let loc = Location::parse("https://s.example/missing").unwrap();
        assert_eq!(
            resolve_location(&loc, &MemoryStore::default(), &statics()),
            PLACEHOLDER
        );
        assert_eq!(
            resolve_location(&loc, &MemoryStore::failing(), &statics()),
            PLACEHOLDER
        );
    }

    #[test]
    fn test_nothing_loads_info() {
        let loc = Location::parse("https://s.example/").unwrap();
        let store = MemoryStore::default();
        assert_eq!(resolve_location(&loc, &store, &statics()), "info\n\npage");
        assert_eq!(
            resolve_location(&loc, &store, &MemoryStatic::default()),
            PLACEHOLDER
        );
    }

    #[test]
    fn test_share_link_inline_when_fragment_present() {
        let loc = Location::parse("https://s.example/#old").unwrap();
        let store = MemoryStore::failing();
        let link = share_link("hello", &loc, &store).unwrap();
        let shared = Location::parse(&link).unwrap();
        assert_eq!(shared.token().map(codec::decode).as_deref(), Some("hello"));
    }

    #[test]
    fn test_share_link_stores_token() {
        let loc = Location::at_origin("https://s.example/");
        let store = MemoryStore::default();
        let link = share_link("hello", &loc, &store).unwrap();
        assert_eq!(link, "https://s.example/k1");
        let shared = Location::parse(&link).unwrap();
        assert_eq!(resolve_location(&shared, &store, &statics()), "hello");

        assert!(share_link("hello", &loc, &MemoryStore::failing()).is_err());
    }

    #[test]
    fn test_set_content_resets_navigation() {
        let mut session = Session::default();
        session.set_content("a\n\nb\n\nc");
        assert!(session.handle_key(NavKey::ArrowRight));
        assert!(session.handle_key(NavKey::ArrowRight));
        assert_eq!(session.navigator().index(), 2);

        session.set_content("x\n\ny");
        assert_eq!(session.navigator().index(), 0);
        assert_eq!(session.navigator().len(), 2);
    }

    #[test]
    fn test_edit_mode_ignores_keys() {
        let mut session = Session::default();
        session.set_content("a\n\nb");
        session.set_mode(Mode::Edit);
        assert!(!session.handle_key(NavKey::ArrowRight));
        session.toggle_mode();
        assert_eq!(session.mode(), Mode::View);
        assert!(session.handle_key(NavKey::ArrowRight));
        assert!(!session.handle_key(NavKey::Other));
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut session = Session::default();
        let first = session.begin_request();
        let second = session.begin_request();
        assert!(!session.finish_request(first, "old".to_string()));
        assert_eq!(session.content(), INITIAL_CONTENT);
        assert!(session.finish_request(second, "new".to_string()));
        assert_eq!(session.content(), "new");
    }

    #[test]
    fn test_edit_supersedes_pending_load() {
        let mut session = Session::default();
        let ticket = session.begin_request();
        session.set_content("typed");
        assert!(!session.finish_request(ticket, "loaded".to_string()));
        assert_eq!(session.content(), "typed");
    }

    #[test]
    fn test_style_follows_frontmatter() {
        let mut session = Session::default();
        session.set_content("---\ntheme: dark\naccent: red\n---\nhi");
        assert_eq!(session.pending_theme(), Some("dark"));
        session.refresh_style(&BuiltinThemes);
        assert_eq!(session.pending_theme(), None);
        assert_eq!(session.style().vars().get("accent"), Some("red"));
        assert_eq!(session.style().vars().get("background"), Some("#1e1e1e"));

        session.set_content("---\ntheme: dark\naccent: red\n---\nother body");
        assert_eq!(session.pending_theme(), None);
    }

    #[test]
    fn test_configured_default_theme() {
        let mut session = Session::default().with_default_theme("dark");
        session.set_content("no frontmatter");
        assert_eq!(session.pending_theme(), Some("dark"));
        session.set_content("---\ntheme: default\n---\nhi");
        assert_eq!(session.theme(), "default");
    }

    #[test]
    fn test_stale_theme_ignored() {
        let mut session = Session::default();
        session.set_content("---\ntheme: dark\n---\nhi");
        assert!(!session.apply_theme("default", None));
        assert!(session.apply_theme("dark", Some(StyleVars::default())));
    }
}
