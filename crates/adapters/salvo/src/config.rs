//! Salvo configuration.

use serde::Deserialize;

/// Configuration of the salvo driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SalvoConfig {
    pub salvos: Vec<Salvo>,
}

/// A watched topic and the triggers it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Salvo {
    pub topic: String,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

/// A trigger value and the scene it fires.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Trigger {
    pub value: String,
    /// Topic the `{status: <value>}` confirmation goes to.
    pub revertive: String,
    #[serde(default)]
    pub actions: Vec<SalvoAction>,
}

/// One publish of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SalvoAction {
    pub topic: String,
    pub value: String,
}

impl Salvo {
    /// Triggers matching `payload`, in configuration order.
    pub fn matching<'a>(&'a self, payload: &'a str) -> impl Iterator<Item = &'a Trigger> + 'a {
        self.triggers.iter().filter(move |t| t.value == payload)
    }
}
