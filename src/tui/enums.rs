//! Enumerations for TUI state management.

/// Screen currently shown.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    Board,
    Help,
}

/// The list the board is focused on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pane {
    Ranking,
    Goals,
    Projects,
    Tasks,
}

impl Pane {
    pub const ALL: [Pane; 4] = [Pane::Ranking, Pane::Goals, Pane::Projects, Pane::Tasks];

    pub fn index(self) -> usize {
        match self {
            Pane::Ranking => 0,
            Pane::Goals => 1,
            Pane::Projects => 2,
            Pane::Tasks => 3,
        }
    }

    pub fn next(self) -> Pane {
        Pane::ALL[(self.index() + 1) % Pane::ALL.len()]
    }

    pub fn prev(self) -> Pane {
        Pane::ALL[(self.index() + Pane::ALL.len() - 1) % Pane::ALL.len()]
    }

    pub fn title(self) -> &'static str {
        match self {
            Pane::Ranking => "Ranking",
            Pane::Goals => "Goals",
            Pane::Projects => "Projects",
            Pane::Tasks => "Tasks",
        }
    }

    /// Whether entries in this pane can be moved by hand.
    pub fn reorderable(self) -> bool {
        !matches!(self, Pane::Ranking)
    }
}
