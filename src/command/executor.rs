//! Command execution - validates diplomatic commands and applies them

use serde::Serialize;

use crate::command::diplomacy::DiplomacyCommand;
use crate::core::types::Tick;
use crate::diplomacy::events::EventSink;
use crate::diplomacy::registry::EntityRegistry;
use crate::diplomacy::store::RelationshipStore;

/// Runs commands validate-then-execute against one store
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute a command if it validates. A rejected command never touches
    /// the store.
    pub fn execute(
        store: &mut RelationshipStore,
        registry: &dyn EntityRegistry,
        command: &DiplomacyCommand,
        tick: Tick,
        events: &mut dyn EventSink,
    ) -> ExecutionResult {
        if let Err(rejection) = command.validate(store, registry) {
            tracing::debug!("Rejected {}: {}", command.name(), rejection);
            return ExecutionResult {
                command: *command,
                executed: false,
                error: Some(rejection.0),
            };
        }

        match command.execute(store, tick, events) {
            Ok(()) => ExecutionResult {
                command: *command,
                executed: true,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Failed to execute {}: {}", command.name(), e);
                ExecutionResult {
                    command: *command,
                    executed: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Execute commands in order; later commands see earlier effects
    pub fn execute_all(
        store: &mut RelationshipStore,
        registry: &dyn EntityRegistry,
        commands: &[DiplomacyCommand],
        tick: Tick,
        events: &mut dyn EventSink,
    ) -> Vec<ExecutionResult> {
        commands
            .iter()
            .map(|command| Self::execute(store, registry, command, tick, events))
            .collect()
    }
}

/// Result of executing a command
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub command: DiplomacyCommand,
    pub executed: bool,
    pub error: Option<String>,
}
