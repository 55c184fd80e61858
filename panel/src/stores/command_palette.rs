use serde::Serialize;

use crate::constants::shortcuts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandGroup {
    Navigation,
    QuickActions,
}

#[derive(Debug, Clone, Serialize)]
pub struct Command {
    pub label: &'static str,
    pub group: CommandGroup,
    pub target: &'static str,
}

const COMMANDS: &[Command] = &[
    Command { label: "Dashboard", group: CommandGroup::Navigation, target: "/" },
    Command { label: "Agents", group: CommandGroup::Navigation, target: "/agents" },
    Command { label: "Rules", group: CommandGroup::Navigation, target: "/rules" },
    Command { label: "Routes", group: CommandGroup::Navigation, target: "/routes" },
    Command { label: "GeoDNS", group: CommandGroup::Navigation, target: "/geodns" },
    Command { label: "Users", group: CommandGroup::Navigation, target: "/users" },
    Command { label: "Analytics", group: CommandGroup::Navigation, target: "/analytics" },
    Command { label: "Settings", group: CommandGroup::Navigation, target: "/settings" },
    Command { label: "Audit Logs", group: CommandGroup::Navigation, target: "/audit-logs" },
    Command { label: "Create Agent", group: CommandGroup::QuickActions, target: "/agents?action=create" },
    Command { label: "Create Rule", group: CommandGroup::QuickActions, target: "/rules?action=create" },
    Command { label: "Create Route", group: CommandGroup::QuickActions, target: "/routes?action=create" },
    Command { label: "Create DNS Record", group: CommandGroup::QuickActions, target: "/geodns?action=create" },
    Command { label: "Create User", group: CommandGroup::QuickActions, target: "/users?action=create" },
];

/// Transient palette state; never persisted
#[derive(Debug, Default)]
pub struct CommandPalette {
    is_open: bool,
    search: String,
}

impl CommandPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.search.clear();
    }

    pub fn toggle(&mut self) {
        if self.is_open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Returns true when the key chord was consumed
    pub fn handle_shortcut(&mut self, chord: &str) -> bool {
        let chord = chord.to_lowercase();
        if shortcuts::COMMAND_PALETTE.contains(&chord.as_str()) {
            self.toggle();
            return true;
        }
        false
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn commands(&self) -> Vec<&'static Command> {
        let needle = self.search.trim().to_lowercase();
        COMMANDS
            .iter()
            .filter(|c| needle.is_empty() || c.label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Run the command with this label: returns its navigation target and closes
    pub fn select(&mut self, label: &str) -> Option<&'static str> {
        let target = COMMANDS
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(label))
            .map(|c| c.target);
        if target.is_some() {
            self.close();
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_toggles_palette() {
        let mut palette = CommandPalette::new();
        assert!(palette.handle_shortcut("Ctrl+K"));
        assert!(palette.is_open());
        assert!(palette.handle_shortcut("cmd+k"));
        assert!(!palette.is_open());
        assert!(!palette.handle_shortcut("ctrl+j"));
    }

    #[test]
    fn test_search_filters_commands() {
        let mut palette = CommandPalette::new();
        palette.open();
        palette.set_search("create");
        let labels: Vec<_> = palette.commands().iter().map(|c| c.label).collect();
        assert_eq!(labels.len(), 5);
        assert!(labels.iter().all(|l| l.starts_with("Create")));

        palette.set_search("dns");
        let labels: Vec<_> = palette.commands().iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["GeoDNS", "Create DNS Record"]);
    }

    #[test]
    fn test_select_returns_target_and_closes() {
        let mut palette = CommandPalette::new();
        palette.open();
        palette.set_search("agent");
        assert_eq!(palette.select("Create Agent"), Some("/agents?action=create"));
        assert!(!palette.is_open());
        assert!(palette.commands().len() > 5);
        assert_eq!(palette.select("Nope"), None);
    }
}
