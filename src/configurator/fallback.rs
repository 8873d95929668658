//! Fallback configurator producing a minimal valid topology.

use crate::config::schema::SinkKind;
use crate::configurator::Configurator;
use crate::level::Level;
use crate::sink::ConsoleStream;
use crate::topology::{Diagnostics, SinkSpec, TopologyBuilder, ROOT_ALIAS};

pub const FALLBACK_SINK: &str = "console";

/// Root group `*` at INFO writing to one console sink.
#[derive(Debug, Clone)]
pub struct FallbackConfigurator {
    level: Level,
    color: bool,
}

impl FallbackConfigurator {
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            color: false,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for FallbackConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurator for FallbackConfigurator {
    fn configure(&self, builder: &mut TopologyBuilder) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        builder.begin_layer();

        let console = SinkSpec::Declared(SinkKind::Console {
            color: self.color,
            stream: ConsoleStream::Stdout,
        });
        if let Err(e) = builder.register_sink(FALLBACK_SINK, console) {
            diagnostics.error(e);
        }
        // `*` overlays the root if an earlier layer already declared one.
        if let Err(e) = builder.upsert_group(
            ROOT_ALIAS,
            None,
            Some(self.level),
            Some(FALLBACK_SINK),
            &mut diagnostics,
        ) {
            diagnostics.error(e);
        }
        diagnostics
    }
}
