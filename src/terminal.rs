use std::process::Command;

use crate::{InventarioResult, ResumoArquivo, Resposta};

/// Limpa o terminal.
pub fn clear_screen(clear_screen: bool) -> InventarioResult<()> {
    if clear_screen {
        if cfg!(target_os = "windows") {
            // 'cls' é um comando interno do 'cmd'
            Command::new("cmd").args(["/c", "cls"]).status()?;
        } else {
            Command::new("clear").status()?;
        }
    }

    Ok(())
}

/// Exibe a descrição e a versão do programa.
pub fn imprimir_versao_do_programa() {
    let descr = [
        "Este programa converte arquivos CSV exportados por coletores de código de barras/QR",
        "em um relatório de inventário no formato Excel (.xlsx).",
        "Tipos de material: Bobina (Code128, CODE_39 e QR) e Produto Acabado (código composto).",
        "Leituras inválidas permanecem no relatório com um marcador de erro (ex.: \"erro QR/-\").",
    ];

    for line in &descr {
        println!(" {line}");
    }

    println!("\n versão: {}\n", env!("CARGO_PKG_VERSION"));
}

/// Formata um número com separador de milhares: 1234567 -> "1.234.567"
pub fn fmt_milhares(n: usize) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    s.chars().enumerate().for_each(|(i, c)| {
        if i > 0 && (len - i).is_multiple_of(3) {
            result.push('.');
        }
        result.push(c);
    });

    result
}

/// Tabela com o resultado de cada arquivo CSV.
pub fn imprimir_resumo(resposta: &Resposta) {
    println!(" Arquivos convertidos:\n");

    for (nome, resumo) in &resposta.resumos {
        println!(
            " {:>8} linhas ({:>6} com erro): {nome}",
            fmt_milhares(resumo.linhas_mantidas),
            fmt_milhares(resumo.total_de_erros()),
        );
        imprimir_erros(resumo);
    }

    println!(
        "\n Total: {} linhas em <{}>",
        fmt_milhares(resposta.total_de_linhas),
        resposta.nome_arquivo
    );
    println!(" Impressão digital: {}\n", resposta.impressao_digital);
}

fn imprimir_erros(resumo: &ResumoArquivo) {
    for (erro, quantidade) in &resumo.erros {
        println!("{:>20} {:>6}x  \"{erro}\"", "", fmt_milhares(*quantidade));
    }
}
