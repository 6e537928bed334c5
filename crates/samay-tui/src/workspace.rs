//! WorkspaceManager: Dashboard/Docs tab switching and the focus ring for the
//! active tab.

use crate::action::{ComponentId, Workspace};
use crate::focus::FocusRing;

pub struct WorkspaceManager {
    pub workspace: Workspace,
    pub show_help: bool,
    pub show_keys_bar: bool,
    pub show_plot_dialog: bool,
    pub focus: FocusRing,
}

impl WorkspaceManager {
    pub fn new() -> Self {
        let mut wm = Self {
            workspace: Workspace::Dashboard,
            show_help: false,
            show_keys_bar: true,
            show_plot_dialog: false,
            focus: FocusRing::default(),
        };
        wm.rebuild_focus_ring();
        wm
    }

    pub fn rebuild_focus_ring(&mut self) {
        let items = match self.workspace {
            Workspace::Dashboard => vec![
                ComponentId::ModelList,
                ComponentId::DatasetPanel,
                ComponentId::ForecastPanel,
            ],
            Workspace::Docs => vec![ComponentId::DocsPanel],
        };
        self.focus.set_items(items);
    }

    pub fn set_workspace(&mut self, ws: Workspace) {
        if self.workspace != ws {
            self.workspace = ws;
            self.show_plot_dialog = false;
            self.rebuild_focus_ring();
        }
    }

    pub fn focused(&self) -> Option<ComponentId> {
        self.focus.current()
    }

    pub fn focus_next(&mut self) -> Option<ComponentId> {
        self.focus.next()
    }

    pub fn focus_prev(&mut self) -> Option<ComponentId> {
        self.focus.prev()
    }

    pub fn focus_set(&mut self, id: ComponentId) {
        self.focus.set(id);
    }
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new()
    }
}
