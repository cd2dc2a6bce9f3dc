use std::sync::Once;

use env_logger::Env;

/// Used when `RUST_LOG` is unset. wgpu and naga are chatty at `info`.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Installs the global logger from `RUST_LOG`, or [`DEFAULT_FILTER`].
/// Later calls, or a logger installed elsewhere, leave things as they are.
pub fn init_logging() {
    INIT.call_once(|| {
        let env = Env::default().default_filter_or(DEFAULT_FILTER);
        if env_logger::Builder::from_env(env).try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging();
        init_logging();
        log::warn!("still logging");
    }
}
