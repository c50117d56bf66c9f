//! Navigation tabs shown on an accident record.

use serde::{Deserialize, Serialize};

use crate::format::Locale;
use crate::model::EntityId;

/// What the current user may do with accidents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissions {
    pub accident_read: bool,
}

/// One navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub url: String,
    pub label: String,
    pub icon: String,
    pub key: String,
}

/// Labels of the four built-in tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabels {
    pub card: String,
    pub events: String,
    pub work_stop: String,
    pub metadata: String,
}

impl TabLabels {
    /// The built-in labels of a language.
    pub fn for_locale(locale: &Locale) -> Self {
        let words = locale.words();
        Self {
            card: words.tab_card.to_string(),
            events: words.tab_events.to_string(),
            work_stop: words.tab_work_stop.to_string(),
            metadata: words.tab_metadata.to_string(),
        }
    }
}

/// A tab contributed by configuration.
///
/// `{id}` in the URL is replaced by the accident id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraTab {
    pub key: String,
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
}

/// Build the tabs of an accident card.
///
/// The four built-in tabs need read permission. Extra tabs follow them
/// whenever the built-in ones are shown.
pub fn accident_tabs(
    accident: EntityId,
    permissions: &Permissions,
    labels: &TabLabels,
    base_url: &str,
    extra: &[ExtraTab],
) -> Vec<Tab> {
    if !permissions.accident_read {
        return Vec::new();
    }

    let base = base_url.trim_end_matches('/');
    let builtin = [
        (
            "accident_card.php?id=",
            &labels.card,
            "fas fa-address-card",
            "accidentCard",
        ),
        (
            "accident_agenda.php?id=",
            &labels.events,
            "fas fa-calendar",
            "accidentAgenda",
        ),
        (
            "accident_attendants.php?id=",
            &labels.work_stop,
            "fas fa-file-signature",
            "accidentWorkStop",
        ),
        (
            "accident_metadata.php?action=create&id=",
            &labels.metadata,
            "fas fa-file-signature",
            "accidentMetadata",
        ),
    ];

    let mut tabs: Vec<Tab> = builtin
        .into_iter()
        .map(|(page, label, icon, key)| Tab {
            url: format!("{base}/{page}{accident}"),
            label: label.clone(),
            icon: icon.to_string(),
            key: key.to_string(),
        })
        .collect();

    tabs.extend(extra.iter().map(|t| Tab {
        url: t.url.replace("{id}", &accident.to_string()),
        label: t.label.clone(),
        icon: t.icon.clone(),
        key: t.key.clone(),
    }));

    tabs
}
