use execution_time::ExecutionTime;
use std::{fs, process};

use conversor_inventario::{
    InventarioError, InventarioResult, NotificadorLog, clear_screen, executar, get_config,
    imprimir_resumo, imprimir_versao_do_programa, logging,
};

fn main() {
    // Erros para o usuário final, sem stack trace técnico
    if let Err(err) = run() {
        eprintln!("\n[ERRO CRÍTICO]: {err}");
        process::exit(1);
    }
}

fn run() -> InventarioResult<()> {
    let timer = ExecutionTime::start();

    // 1. Obter Configurações
    let config = get_config()?;

    // 2. Setup inicial
    clear_screen(config.clear)?;
    imprimir_versao_do_programa();
    logging::init(config.verbose);

    if config.verbose {
        println!("{:#?}\n", config);
    }

    println!(
        "Convertendo inventário de {} (grupo: {})...\n",
        config.tipo_material, config.grupo
    );

    // 3. Conversão
    let requisicao = config.requisicao()?;
    let resposta = executar(&requisicao, &NotificadorLog)?;

    // 4. Gravar o relatório
    let destino = config.saida.join(&resposta.nome_arquivo);
    fs::write(&destino, &resposta.conteudo).map_err(|e| InventarioError::IoWriter {
        source: e,
        arquivo: destino.clone(),
    })?;

    imprimir_resumo(&resposta);
    println!(" Relatório gravado em <{}>\n", destino.display());
    timer.print_elapsed_time();

    Ok(())
}
