use chrono::NaiveDate;
use clap::Parser;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    ArquivoEnviado, InventarioError, InventarioResult, PoliticaData, PoliticaSimbologia,
    Politicas, REGEX_SEARCH_CSV, Requisicao, TipoMaterial,
};

// Estrutura para o Clap processar os argumentos da linha de comando
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Arguments {
    /// Clear screen
    #[arg(short, long, default_value_t = false)]
    clear: bool,

    /// Tipo de material do inventário
    #[arg(short, long, value_enum, default_value_t = TipoMaterial::Bobina)]
    tipo: TipoMaterial,

    /// Grupo de Produto (compõe o nome do relatório)
    #[arg(short, long, required = true)]
    grupo: String,

    /// Data do inventário: DD-MM-AAAA ou AAAA-MM-DD (opcional)
    #[arg(short, long)]
    data: Option<String>,

    /// Arquivos CSV ou diretórios contendo arquivos CSV
    #[arg(required = true, num_args = 1..)]
    entradas: Vec<PathBuf>,

    /// Diretório onde o relatório será gravado
    #[arg(short = 'o', long, default_value = ".")]
    saida: PathBuf,

    /// O que fazer com leituras de simbologia desconhecida (Bobina)
    #[arg(long, value_enum, default_value_t = PoliticaSimbologia::Vazio)]
    simbologia_desconhecida: PoliticaSimbologia,

    /// O que fazer com datas de leitura inválidas (Bobina)
    #[arg(long, value_enum, default_value_t = PoliticaData::ErroNaLinha)]
    data_invalida: PoliticaData,

    /// Ativar modo detalhado (verbose)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug)]
pub struct Config {
    pub clear: bool,
    pub verbose: bool,
    pub tipo_material: TipoMaterial,
    pub grupo: String,
    pub data: Option<NaiveDate>,
    pub saida: PathBuf,
    pub politicas: Politicas,

    // Arquivos CSV a converter, já expandidos a partir dos diretórios
    pub arquivos_csv: Vec<PathBuf>,
}

impl Config {
    /// Lê o conteúdo dos arquivos e monta a requisição de conversão.
    pub fn requisicao(&self) -> InventarioResult<Requisicao> {
        let arquivos = self
            .arquivos_csv
            .iter()
            .map(|path| {
                let conteudo = fs::read(path).map_err(|e| InventarioError::IoReader {
                    source: e,
                    arquivo: path.clone(),
                })?;
                let nome = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                Ok(ArquivoEnviado { nome, conteudo })
            })
            .collect::<InventarioResult<Vec<_>>>()?;

        Ok(Requisicao {
            tipo_material: self.tipo_material,
            grupo: self.grupo.clone(),
            data: self.data,
            arquivos,
            politicas: self.politicas,
        })
    }
}

pub fn get_config() -> InventarioResult<Config> {
    let config = config_de(Arguments::parse())?;

    // Imprimir aqui, mantendo a função de busca "pura"
    println!(" Arquivo(s) CSV a converter:\n");
    config
        .arquivos_csv
        .iter()
        .enumerate()
        .for_each(|(i, path)| {
            println!("{:6}: {}", i + 1, path.display());
        });
    println!();

    Ok(config)
}

fn config_de(args: Arguments) -> InventarioResult<Config> {
    // 1. Data opcional
    let data = args.data.as_deref().map(parse_data).transpose()?;

    // 2. Expandir diretórios em arquivos CSV
    let mut arquivos_csv = Vec::new();
    for entrada in &args.entradas {
        if entrada.is_dir() {
            arquivos_csv.extend(search_csv_files(entrada)?);
        } else {
            arquivos_csv.push(entrada.clone());
        }
    }

    // 3. Diretório de saída
    if !args.saida.is_dir() {
        return Err(InventarioError::Config(format!(
            "diretório de saída <{}> não existe",
            args.saida.display()
        )));
    }

    Ok(Config {
        clear: args.clear,
        verbose: args.verbose,
        tipo_material: args.tipo,
        grupo: args.grupo,
        data,
        saida: args.saida,
        politicas: Politicas {
            simbologia: args.simbologia_desconhecida,
            data: args.data_invalida,
        },
        arquivos_csv,
    })
}

/// Aceita `DD-MM-AAAA` (como digitado no formulário) ou `AAAA-MM-DD`.
pub fn parse_data(valor: &str) -> InventarioResult<NaiveDate> {
    let valor = valor.trim();

    ["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|formato| NaiveDate::parse_from_str(valor, formato).ok())
        .ok_or_else(|| InventarioError::Config(format!("data inválida: <{valor}>")))
}

/// Procura arquivos CSV em um diretório (ordem alfabética).
pub fn search_csv_files(dir: &Path) -> InventarioResult<Vec<PathBuf>> {
    // 1. Leitura funcional do diretório
    let mut arquivos_csv: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(InventarioError::Io)?
        .flatten() // Ignora erros individuais de DirEntry
        .filter_map(|entry| {
            let path = entry.path();
            let is_match = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|name| REGEX_SEARCH_CSV.is_match(name))
                .unwrap_or_default();

            if path.is_file() && is_match {
                Some(path)
            } else {
                None
            }
        })
        .collect();

    // 2. Validação de existência
    if arquivos_csv.is_empty() {
        return Err(InventarioError::NenhumCsvEncontrado);
    }

    // 3. Ordenação (alfabética)
    arquivos_csv.sort();

    Ok(arquivos_csv)
}
