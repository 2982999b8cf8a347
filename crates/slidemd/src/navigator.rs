//! Slide navigation: a clamped index over the fragment sequence, and the
//! keyboard binding that drives it while the deck is being viewed.

/// Current position in a fragment sequence of length `len`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigator {
    index: usize,
    len: usize,
}

impl Navigator {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The active fragment, `None` for an empty sequence.
    pub fn current(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.index)
    }

    /// Advance one fragment. Returns whether the index moved.
    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.len {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Step back one fragment. Returns whether the index moved.
    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Start over on a freshly rendered sequence.
    pub fn reset(&mut self, len: usize) {
        self.index = 0;
        self.len = len;
    }

    pub fn is_active(&self, fragment: usize) -> bool {
        self.current() == Some(fragment)
    }

    /// Active flag for every fragment, in order. Exactly one is set when the
    /// sequence is not empty.
    pub fn visibility(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.is_active(i))
    }

    pub fn apply(&mut self, command: NavCommand) -> bool {
        match command {
            NavCommand::Next => self.next(),
            NavCommand::Prev => self.prev(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowRight,
    ArrowLeft,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Prev,
}

impl NavKey {
    pub fn command(self) -> Option<NavCommand> {
        match self {
            Self::ArrowRight => Some(NavCommand::Next),
            Self::ArrowLeft => Some(NavCommand::Prev),
            Self::Other => None,
        }
    }
}

/// Proof of a live keyboard subscription. Hand it back to
/// [`KeyBinding::unsubscribe`] to stop navigation input.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "navigation stops only when the subscription is handed back"]
pub struct Subscription {
    id: u64,
}

/// Keyboard navigation that only reacts while subscribed.
#[derive(Debug, Default)]
pub struct KeyBinding {
    active: Option<u64>,
    issued: u64,
}

impl KeyBinding {
    pub fn subscribe(&mut self) -> Subscription {
        self.issued += 1;
        self.active = Some(self.issued);
        tracing::trace!(id = self.issued, "keyboard navigation subscribed");
        Subscription { id: self.issued }
    }

    /// Cancel `subscription`. A handle from an older subscription is ignored.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        if self.active == Some(subscription.id) {
            self.active = None;
            tracing::trace!(id = subscription.id, "keyboard navigation unsubscribed");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// The command for `key`, if the binding is live.
    pub fn dispatch(&self, key: NavKey) -> Option<NavCommand> {
        self.active?;
        key.command()
    }
}
