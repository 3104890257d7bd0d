use std::{io, path::PathBuf};
use thiserror::Error;

/// Tipo de retorno conveniente para todo o projeto
pub type InventarioResult<T> = Result<T, InventarioError>;

#[derive(Error, Debug)]
pub enum InventarioError {
    #[error("Arquivo <{arquivo:?}> não contém nenhuma linha válida!")]
    ArquivoSemDados { arquivo: PathBuf },

    #[error("Erro ao ler planilha: {0}")]
    Calamine(#[from] calamine::Error),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro no processamento CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "Erro no processamento CSV!\n\
        Arquivo: {arquivo:?}\n\
        Linha nº: {linha}\n\
        {source}"
    )]
    CsvLinha {
        #[source]
        source: csv::Error,
        arquivo: PathBuf,
        linha: u64,
    },

    #[error("Data de leitura inválida: <{valor}> (esperado MM-DD-AAAA)")]
    DataInvalida { valor: String },

    #[error("O campo 'Grupo de Produto' deve ser preenchido!")]
    GrupoVazio,

    #[error("Erro de I/O: {0}")]
    Io(#[from] io::Error),

    #[error(
        "Arquivo não encontrado!\n\
        Arquivo: {arquivo:?}\n\
        {source}"
    )]
    IoReader {
        #[source] // Indica que este é o erro original
        source: io::Error,
        arquivo: PathBuf,
    },

    #[error(
        "Não foi possível gravar o arquivo!\n\
        Arquivo: {arquivo:?}\n\
        {source}"
    )]
    IoWriter {
        #[source]
        source: io::Error,
        arquivo: PathBuf,
    },

    #[error("Limite da planilha excedido: {0}")]
    LimitePlanilha(String),

    #[error("Nenhum arquivo .csv foi enviado para conversão!")]
    NenhumArquivoEnviado,

    #[error("Nenhum arquivo .csv foi encontrado para processar!")]
    NenhumCsvEncontrado,

    #[error("Nenhum arquivo Excel intermediário foi gerado!")]
    NenhumArquivoIntermediario,

    #[error("Nenhum dado foi lido dos arquivos intermediários. O arquivo final não será gerado.")]
    NenhumDadoLido,

    #[error("Planilha <{arquivo:?}> não contém abas!")]
    PlanilhaSemAbas { arquivo: PathBuf },

    #[error("Erro ao gravar planilha: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl InventarioError {
    pub fn from_csv(e: csv::Error, arquivo: PathBuf) -> Self {
        // Erros de leitura com posição conhecida recebem o número da linha
        match e.position().map(|pos| pos.line()) {
            Some(linha) => InventarioError::CsvLinha {
                source: e,
                arquivo,
                linha,
            },
            None => InventarioError::Csv(e),
        }
    }
}
