pub const OPEN_ICON: &str = "✖";
pub const CLOSED_ICON: &str = "💬";

/// Open/closed state of the chat panel. Starts closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    open: bool,
}

impl PanelState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn icon(&self) -> &'static str {
        if self.open { OPEN_ICON } else { CLOSED_ICON }
    }

    /// Flips the state and returns the icon for the new state.
    pub fn toggle(&mut self) -> &'static str {
        self.open = !self.open;
        self.icon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_swaps_icon() {
        let mut panel = PanelState::default();
        assert!(!panel.is_open());
        assert_eq!(panel.icon(), CLOSED_ICON);
        assert_eq!(panel.toggle(), OPEN_ICON);
        assert!(panel.is_open());
        assert_eq!(panel.toggle(), CLOSED_ICON);
    }
}
