use crate::{
    engine::RootReport,
    error::HookError,
    options::EngineOptions,
    tree::Tree,
};

/// Optional presentation step run alongside the engine, e.g. building
/// stylesheet data for the fonts that are in use.
///
/// Hooks never change what the engine does. A failing hook is logged and
/// the pass carries on without it.
pub trait PresentationHook {
    /// Called after [`Engine::set_options`](crate::Engine::set_options)
    /// accepts a changed configuration.
    ///
    /// # Errors
    ///
    /// Any failure is logged and otherwise ignored.
    fn options_changed(&mut self, options: &EngineOptions) -> Result<(), HookError> {
        let _ = options;
        Ok(())
    }

    /// Called once per processed root, after all passes ran on it.
    ///
    /// # Errors
    ///
    /// Any failure is logged and otherwise ignored.
    fn root_processed(&mut self, tree: &Tree, report: &RootReport) -> Result<(), HookError> {
        let _ = (tree, report);
        Ok(())
    }
}
