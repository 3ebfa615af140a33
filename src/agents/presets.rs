//! Built-in agent catalogs
//!
//! `legal` is the German law desk: "Agent Dirk" triages and hands off to one
//! specialist per statute. `it-support` is the smaller desk with Python,
//! Windows and PowerShell specialists.
//!
//! The keyword rules in the dispatcher's instructions are advice for the
//! model. Nothing in this crate matches them against user text.

use crate::agents::{Agent, AgentRegistry};
use crate::types::{AppError, Result};
use std::fmt;
use std::str::FromStr;

/// Model used by the presets unless configured otherwise
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Id of the dispatcher in every preset
pub const DISPATCHER_ID: &str = "dirk";

const DISPATCHER_NAME: &str = "Agent Dirk";

/// A specialist of the legal desk
struct Statute {
    id: &'static str,
    name: &'static str,
    /// Word the dispatcher is told to look for
    keyword: &'static str,
    /// How the dispatcher describes the specialist's area
    area: &'static str,
    /// How the specialist's own instructions describe its area
    scope: &'static str,
}

const STATUTES: &[Statute] = &[
    Statute {
        id: "bgb",
        name: "Agent BGB",
        keyword: "BGB",
        area: "das Bürgerliche Gesetzbuch",
        scope: "das Bürgerliche Gesetzbuch (BGB)",
    },
    Statute {
        id: "hgb",
        name: "Agent HGB",
        keyword: "HGB",
        area: "das Handelsgesetzbuch",
        scope: "das Handelsgesetzbuch (HGB)",
    },
    Statute {
        id: "stgb",
        name: "Agent StGB",
        keyword: "StGB",
        area: "das Strafgesetzbuch",
        scope: "das Strafgesetzbuch (StGB)",
    },
    Statute {
        id: "arbeitsrecht",
        name: "Agent Arbeitsrecht",
        keyword: "Arbeitsrecht",
        area: "das Arbeitsgesetzbuch",
        scope: "das Arbeitsgesetzbuch (ArbGB)",
    },
    Statute {
        id: "sozialrecht",
        name: "Agent Sozialrecht",
        keyword: "Sozialrecht",
        area: "das Sozialgesetzbuch",
        scope: "das Sozialgesetzbuch (SGB)",
    },
    Statute {
        id: "steuerrecht",
        name: "Agent Steuerrecht",
        keyword: "Steuerrecht",
        area: "das Steuerrecht",
        scope: "das Steuerrecht (AO, EStG, UStG, etc.)",
    },
    Statute {
        id: "vwvfg",
        name: "Agent Verwaltungsverfahrensgesetz",
        keyword: "Verwaltungsverfahrensgesetz",
        area: "das Verwaltungsverfahrensgesetz",
        scope: "das Verwaltungsverfahrensgesetz (VwVfG)",
    },
    Statute {
        id: "vwgo",
        name: "Agent Verwaltungsgerichtsordnung",
        keyword: "Verwaltungsgerichtsordnung",
        area: "die Verwaltungsgerichtsordnung",
        scope: "die Verwaltungsgerichtsordnung (VwGO)",
    },
    Statute {
        id: "uwg",
        name: "Agent Gesetz gegen den unlauteren Wettbewerb",
        keyword: "Gesetz gegen den unlauteren Wettbewerb",
        area: "das Gesetz gegen den unlauteren Wettbewerb",
        scope: "das Gesetz gegen den unlauteren Wettbewerb (UWG)",
    },
    Statute {
        id: "urhg",
        name: "Agent Urheberrechtsgesetz",
        keyword: "Urheberrechtsgesetz",
        area: "das Urheberrechtsgesetz",
        scope: "das Urheberrechtsgesetz (UrhG)",
    },
    Statute {
        id: "patg",
        name: "Agent Patentrecht",
        keyword: "Patentrecht",
        area: "das Patentrecht",
        scope: "das Patentrecht (PatG)",
    },
    Statute {
        id: "markeng",
        name: "Agent Markengesetz",
        keyword: "Markengesetz",
        area: "das Markengesetz",
        scope: "das Markengesetz (MarkenG)",
    },
    Statute {
        id: "owig",
        name: "Agent Gesetz über Ordnungswidrigkeiten",
        keyword: "Gesetz über Ordnungswidrigkeiten",
        area: "das Gesetz über Ordnungswidrigkeiten",
        scope: "das Gesetz über Ordnungswidrigkeiten (OWiG)",
    },
    Statute {
        id: "baurecht",
        name: "Agent Baurecht",
        keyword: "Baurecht",
        area: "das Baurecht",
        scope: "das Baugesetzbuch (BauGB)",
    },
];

/// Opening question the desktop front-ends put into a fresh transcript
pub const SEED_MESSAGE: &str = "Welche Agenten stehen zur Verfügung? Und wobei helfen sie?";

/// Built-in catalog selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Legal,
    ItSupport,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Legal => "legal",
            Preset::ItSupport => "it-support",
        }
    }

    /// Agent declarations of this preset, dispatcher first
    pub fn agents(&self, model: &str) -> Vec<Agent> {
        match self {
            Preset::Legal => legal_agents(model),
            Preset::ItSupport => it_support_agents(model),
        }
    }

    /// Build the registry for this preset
    pub fn registry(&self, model: &str) -> Result<AgentRegistry> {
        AgentRegistry::builder()
            .with_agents(self.agents(model))
            .with_dispatcher(DISPATCHER_ID)
            .build()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "legal" | "recht" => Ok(Preset::Legal),
            "it-support" | "it_support" | "it" => Ok(Preset::ItSupport),
            other => Err(AppError::Configuration(format!(
                "Unknown catalog preset '{}' (expected 'legal' or 'it-support')",
                other
            ))),
        }
    }
}

fn legal_dispatcher_instructions() -> String {
    let mut text = String::from(
        "Du bist ein freundlicher Service-Agent, der Anfragen filtert und an \
         andere Agenten weitergibt. Wir haben mehrere Agenten: ",
    );
    for (i, statute) in STATUTES.iter().enumerate() {
        text.push_str(&format!(
            "{}. {}: Er ist auf {} spezialisiert. ",
            i + 1,
            statute.keyword,
            statute.area
        ));
    }
    text.push_str("Leite die Anfragen an den entsprechenden Agenten weiter. ");
    for statute in STATUTES {
        text.push_str(&format!(
            "Wenn die Anfrage das Wort '{}' enthält, leite sie an {} weiter. ",
            statute.keyword, statute.name
        ));
    }
    text.trim_end().to_string()
}

fn legal_agents(model: &str) -> Vec<Agent> {
    let dispatcher = Agent::new(
        DISPATCHER_ID,
        DISPATCHER_NAME,
        legal_dispatcher_instructions(),
        model,
    )
    .with_handoffs(STATUTES.iter().map(|s| s.id));

    std::iter::once(dispatcher)
        .chain(STATUTES.iter().map(|s| {
            Agent::new(
                s.id,
                s.name,
                format!(
                    "Du bist spezialisiert auf {} und gibst detaillierte Informationen \
                     und Ratschläge zu diesem Bereich.",
                    s.scope
                ),
                model,
            )
        }))
        .collect()
}

fn it_support_agents(model: &str) -> Vec<Agent> {
    vec![
        Agent::new(
            DISPATCHER_ID,
            DISPATCHER_NAME,
            "Du bist ein freundlicher Service-Agent, der Anfragen filtert und an \
             andere Agenten weitergibt. Wir haben drei Agenten: \
             1. Mona: Sie ist auf Python-Code spezialisiert. \
             2. Peter: Er ist auf Windows-Probleme spezialisiert. \
             3. Ralf: Er ist auf PowerShell-Prompts spezialisiert. \
             Leite die Anfragen an den entsprechenden Agenten weiter.",
            model,
        )
        .with_handoffs(["mona", "peter", "ralf"]),
        Agent::new(
            "mona",
            "Agent Mona",
            "Du analysierst und erstellst professionellen Python-Code.",
            model,
        ),
        Agent::new(
            "peter",
            "Agent Peter",
            "Du hilfst bei Windows-Problemen und gibst detaillierte Anweisungen zur Lösung.",
            model,
        ),
        Agent::new(
            "ralf",
            "Agent Ralf",
            "Du hilfst bei PowerShell-Prompts und gibst detaillierte Anweisungen zur Lösung.",
            model,
        ),
    ]
}
