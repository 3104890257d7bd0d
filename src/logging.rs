use tracing_subscriber::{EnvFilter, fmt};

/// Inicializa o log (tracing).
///
/// O nível vem de `RUST_LOG`; sem a variável, `info` (ou `debug` no modo verbose).
///
/// ```no_run
/// conversor_inventario::logging::init(false);
/// ```
pub fn init(verbose: bool) {
    let padrao = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(padrao));

    // stderr: a saída padrão fica para o resumo da conversão
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log para os testes (capturado pelo harness).
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
