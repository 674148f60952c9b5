use serde::Serialize;

use super::discovery::PrinterDescriptor;

/// Which printer the card currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "key", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
}

impl Selection {
    pub fn key(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(key) => Some(key),
        }
    }
}

/// Outcome of one reducer step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub selection: Selection,
    /// The selected key differs from the prior one; the view must re-render
    /// even if nothing else changed.
    pub changed: bool,
}

/// Resolve the selection for a new discovery result.
///
/// `user_choice` is an explicit pick from the printer selector; it wins when
/// it names a discovered printer and is ignored otherwise. `default_printer`
/// only applies when nothing was selected before.
pub fn reduce(
    prior: &Selection,
    printers: &[PrinterDescriptor],
    default_printer: Option<&str>,
    user_choice: Option<&str>,
) -> Transition {
    let Some(first) = printers.first() else {
        return Transition {
            changed: prior.key().is_some(),
            selection: Selection::Unselected,
        };
    };

    let next = if let Some(key) = user_choice.filter(|key| is_present(printers, key)) {
        Selection::Selected(key.to_string())
    } else {
        match prior {
            Selection::Unselected => {
                let preferred = default_printer
                    .filter(|want| !want.is_empty())
                    .and_then(|want| printers.iter().find(|p| p.key.contains(want)));
                Selection::Selected(preferred.unwrap_or(first).key.clone())
            }
            Selection::Selected(key) if is_present(printers, key) => prior.clone(),
            // The old pick went stale; the default preference already had its turn.
            Selection::Selected(_) => Selection::Selected(first.key.clone()),
        }
    };

    Transition {
        changed: next.key() != prior.key(),
        selection: next,
    }
}

fn is_present(printers: &[PrinterDescriptor], key: &str) -> bool {
    printers.iter().any(|p| p.key == key)
}
