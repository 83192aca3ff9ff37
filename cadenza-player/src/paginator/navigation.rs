//! Navigation events understood by the paginator

/// Closed set of paginator actions, independent of transport markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Prev,
    Next,
    Cancel,
}

impl Navigation {
    /// Order in which markers are attached to a message
    pub const ALL: [Navigation; 3] = [Navigation::Prev, Navigation::Next, Navigation::Cancel];

    pub fn marker(self) -> &'static str {
        match self {
            Navigation::Prev => "◀️",
            Navigation::Next => "▶️",
            Navigation::Cancel => "❌",
        }
    }

    /// Map a transport marker to an action; anything else is not ours
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|nav| nav.marker() == marker)
    }
}
