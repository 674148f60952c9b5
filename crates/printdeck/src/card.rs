use std::collections::HashMap;

use tracing::debug;
use tracing::info;

use crate::actions::merge_actions;
use crate::actions::toggle_command;
use crate::actions::ActionDescriptor;
use crate::actions::Control;
use crate::actions::ServiceCommand;
use crate::config::CardConfig;
use crate::engine::discover;
use crate::engine::reduce;
use crate::engine::Aggregator;
use crate::engine::PrinterDescriptor;
use crate::engine::Selection;
use crate::engine::StatusSnapshot;
use crate::host::Host;
use crate::state::StateSnapshot;
use crate::view::CardView;

/// The printer card.
///
/// Holds the last snapshot the host delivered and everything derived from
/// it. The selection is the only value carried from one tick to the next.
pub struct Card {
    config: CardConfig,
    actions: HashMap<String, ActionDescriptor>,
    states: StateSnapshot,
    printers: Vec<PrinterDescriptor>,
    selection: Selection,
    status: Option<StatusSnapshot>,
}

impl Card {
    pub fn new(mut config: CardConfig) -> Self {
        let actions = merge_actions(std::mem::take(&mut config.actions));
        Self {
            config,
            actions,
            states: StateSnapshot::default(),
            printers: Vec::new(),
            selection: Selection::Unselected,
            status: None,
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn printers(&self) -> &[PrinterDescriptor] {
        &self.printers
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.as_ref()
    }

    pub fn states(&self) -> &StateSnapshot {
        &self.states
    }

    /// Take a new snapshot from the host and recompute everything.
    ///
    /// Returns true when the selected printer changed, in which case the view
    /// must be re-rendered even if no other value did.
    pub fn set_states(&mut self, states: StateSnapshot, host: Option<&dyn Host>) -> bool {
        self.states = states;
        self.refresh(None, host)
    }

    /// Apply a pick from the printer selector. Keys that are not currently
    /// discovered are ignored. Returns whether the selection changed.
    pub fn select_printer(&mut self, key: &str, host: Option<&dyn Host>) -> bool {
        self.refresh(Some(key), host)
    }

    fn refresh(&mut self, user_choice: Option<&str>, host: Option<&dyn Host>) -> bool {
        let filter = Some(self.config.filter_prefix.as_str());
        let printers = discover(&self.states, filter);
        if printers.len() != self.printers.len() {
            debug!("Discovered {} printer(s)", printers.len());
        }
        self.printers = printers;

        let transition = reduce(
            &self.selection,
            &self.printers,
            self.config.default_printer.as_deref(),
            user_choice,
        );
        if transition.changed {
            info!("Selected printer: {:?}", transition.selection.key());
        }
        self.selection = transition.selection;

        self.status = self.selection.key().map(|key| {
            Aggregator::new(&self.config.cameras, host).aggregate(&self.states, key)
        });

        transition.changed
    }

    /// Run the named action for the selected printer.
    ///
    /// Unknown names, a missing selection and a missing host all make this a
    /// no-op. Returns the command that was sent.
    pub fn do_action(&self, name: &str, host: Option<&dyn Host>) -> Option<ServiceCommand> {
        let key = self.selection.key()?;
        let Some(action) = self.actions.get(name) else {
            debug!("Unknown action '{}', ignoring", name);
            return None;
        };
        let host = host?;

        let cmd = action.command(key);
        cmd.clone().dispatch(host);
        Some(cmd)
    }

    /// Flip one of the selected printer's switches.
    pub fn toggle(&self, control: Control, host: Option<&dyn Host>) -> Option<ServiceCommand> {
        let key = self.selection.key()?;
        self.toggle_entity(&control.entity_id(key), host)
    }

    /// Flip any switch-like entity present in the current snapshot.
    pub fn toggle_entity(&self, entity_id: &str, host: Option<&dyn Host>) -> Option<ServiceCommand> {
        let host = host?;
        let cmd = toggle_command(&self.states, entity_id)?;
        cmd.clone().dispatch(host);
        Some(cmd)
    }

    pub fn view(&self) -> CardView {
        CardView::build(self)
    }
}
