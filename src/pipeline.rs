use chrono::NaiveDate;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use crate::{
    ABA_INVENTARIO_CONSOLIDADO, ABA_INVENTARIO_UNIFICADO, ARQUIVO_INVENTARIO,
    ARQUIVO_INVENTARIO_FINAL, InventarioError, InventarioResult, PASTA_CSV_ORIGINAL,
    PASTA_EXCEL_INTERMEDIARIO, Politicas, ResumoArquivo, Tabela, consolidar_abas,
    converter_arquivo, escrever_planilha, mesclar_bobina, reunir_abas, search_csv_files,
};

/// Tipo de material do inventário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TipoMaterial {
    /// Bobinas: leituras Code128/CODE_39/QR com lote e peso
    Bobina,
    /// Produto acabado: código composto expandido em 14 colunas
    #[value(name = "produto-acabado")]
    ProdutoAcabado,
}

impl fmt::Display for TipoMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TipoMaterial::Bobina => f.write_str("Bobina"),
            TipoMaterial::ProdutoAcabado => f.write_str("Produto Acabado"),
        }
    }
}

/// Arquivo CSV enviado para conversão (nome original preservado).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArquivoEnviado {
    pub nome: String,
    pub conteudo: Vec<u8>,
}

/// Tudo o que uma conversão precisa: nada vem de estado global.
#[derive(Debug, Clone, PartialEq)]
pub struct Requisicao {
    pub tipo_material: TipoMaterial,
    /// Grupo de Produto (obrigatório)
    pub grupo: String,
    pub data: Option<NaiveDate>,
    pub arquivos: Vec<ArquivoEnviado>,
    pub politicas: Politicas,
}

impl Requisicao {
    /// `Inventario <grupo>[ <DD-MM-AA>].xlsx`
    ///
    /// ### Exemplo
    /// ```
    /// use chrono::NaiveDate;
    /// use conversor_inventario::{Politicas, Requisicao, TipoMaterial};
    ///
    /// let mut req = Requisicao {
    ///     tipo_material: TipoMaterial::Bobina,
    ///     grupo: "Aço Galvanizado".to_string(),
    ///     data: None,
    ///     arquivos: Vec::new(),
    ///     politicas: Politicas::default(),
    /// };
    /// assert_eq!(req.nome_do_relatorio(), "Inventario Aço Galvanizado.xlsx");
    ///
    /// req.data = NaiveDate::from_ymd_opt(2024, 3, 5);
    /// assert_eq!(req.nome_do_relatorio(), "Inventario Aço Galvanizado 05-03-24.xlsx");
    /// ```
    pub fn nome_do_relatorio(&self) -> String {
        match self.data {
            Some(data) => format!(
                "Inventario {} {}.xlsx",
                self.grupo.trim(),
                data.format("%d-%m-%y")
            ),
            None => format!("Inventario {}.xlsx", self.grupo.trim()),
        }
    }
}

/// Relatório gerado.
#[derive(Debug, Clone, PartialEq)]
pub struct Resposta {
    pub nome_arquivo: String,
    pub conteudo: Vec<u8>,
    pub total_de_linhas: usize,
    /// blake3 dos dados da tabela final (igual entre execuções com as mesmas entradas)
    pub impressao_digital: String,
    /// Resumo por arquivo CSV convertido, na ordem de processamento
    pub resumos: Vec<(String, ResumoArquivo)>,
}

/// Mensagens de andamento da conversão.
pub trait Notificador {
    fn progresso(&self, msg: &str);
    /// Problema em um arquivo: o arquivo é ignorado e a conversão continua
    fn aviso(&self, msg: &str);
    fn sucesso(&self, msg: &str);
    fn erro(&self, msg: &str);
}

/// Notificador que apenas registra no log (tracing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificadorLog;

impl Notificador for NotificadorLog {
    fn progresso(&self, msg: &str) {
        info!("{msg}");
    }

    fn aviso(&self, msg: &str) {
        warn!("{msg}");
    }

    fn sucesso(&self, msg: &str) {
        info!("{msg}");
    }

    fn erro(&self, msg: &str) {
        error!("{msg}");
    }
}

/// Executa a conversão completa em um diretório temporário exclusivo.
///
/// O diretório é removido ao final, com ou sem erro. Se nenhuma linha
/// sobreviver, retorna erro: nunca um relatório vazio.
pub fn executar(
    requisicao: &Requisicao,
    notificador: &dyn Notificador,
) -> InventarioResult<Resposta> {
    match executar_etapas(requisicao, notificador) {
        Ok(resposta) => {
            notificador.sucesso("Conversão finalizada com sucesso!");
            Ok(resposta)
        }
        Err(e) => {
            notificador.erro(&format!("Ocorreu um erro durante o processo: {e}"));
            Err(e)
        }
    }
}

fn executar_etapas(
    requisicao: &Requisicao,
    notificador: &dyn Notificador,
) -> InventarioResult<Resposta> {
    // 1. Validação da requisição
    if requisicao.grupo.trim().is_empty() {
        return Err(InventarioError::GrupoVazio);
    }
    if requisicao.arquivos.is_empty() {
        return Err(InventarioError::NenhumArquivoEnviado);
    }

    // 2. Diretório de trabalho (removido no drop)
    let temp = tempfile::tempdir()?;
    let pasta_csv = temp.path().join(PASTA_CSV_ORIGINAL);
    let pasta_excel = temp.path().join(PASTA_EXCEL_INTERMEDIARIO);
    fs::create_dir(&pasta_csv)?;
    fs::create_dir(&pasta_excel)?;

    // 3. Gravar os arquivos enviados
    for arquivo in &requisicao.arquivos {
        fs::write(pasta_csv.join(nome_seguro(&arquivo.nome)), &arquivo.conteudo)?;
    }

    let csvs = search_csv_files(&pasta_csv)?;
    let etapas = match requisicao.tipo_material {
        TipoMaterial::Bobina => 2,
        TipoMaterial::ProdutoAcabado => 3,
    };

    // 4. Etapa 1: um Excel por CSV
    notificador.progresso(&format!(
        "Etapa 1 de {etapas}: Convertendo cada CSV para um Excel formatado..."
    ));

    let mut resumos = Vec::with_capacity(csvs.len());
    for csv_path in &csvs {
        match converter_arquivo(
            csv_path,
            &pasta_excel,
            requisicao.tipo_material,
            &requisicao.politicas,
        ) {
            Ok(convertido) => resumos.push((nome_do_arquivo(csv_path), convertido.resumo)),
            Err(e) => notificador.aviso(&format!(
                "Não foi possível ler o arquivo {}. Erro: {e}",
                nome_do_arquivo(csv_path)
            )),
        }
    }

    let planilhas = listar_planilhas(&pasta_excel)?;
    if planilhas.is_empty() {
        return Err(InventarioError::NenhumArquivoIntermediario);
    }

    // 5. Etapa 2 (e 3): mesclagem
    notificador.progresso(&format!(
        "Etapa 2 de {etapas}: Unificando todos os arquivos Excel em um relatório final..."
    ));

    let inventario = temp.path().join(ARQUIVO_INVENTARIO);
    let (tabela, arquivo_final): (Tabela, PathBuf) = match requisicao.tipo_material {
        TipoMaterial::Bobina => {
            let tabela = mesclar_bobina(&planilhas, notificador)?;
            escrever_planilha(&inventario, &[(ABA_INVENTARIO_UNIFICADO, &tabela)])?;
            (tabela, inventario)
        }
        TipoMaterial::ProdutoAcabado => {
            reunir_abas(&planilhas, &inventario, notificador)?;

            notificador.progresso(&format!(
                "Etapa 3 de {etapas}: Consolidando as abas em uma única tabela..."
            ));

            let tabela = consolidar_abas(&inventario)?;
            let arquivo_final = temp.path().join(ARQUIVO_INVENTARIO_FINAL);
            escrever_planilha(&arquivo_final, &[(ABA_INVENTARIO_CONSOLIDADO, &tabela)])?;
            (tabela, arquivo_final)
        }
    };

    // 6. Resposta (o diretório temporário é removido ao sair)
    let conteudo = fs::read(&arquivo_final).map_err(|e| InventarioError::IoReader {
        source: e,
        arquivo: arquivo_final.clone(),
    })?;
    let impressao_digital = tabela.impressao_digital();

    info!(
        "Relatório <{}>: {} linhas, impressão digital {}",
        requisicao.nome_do_relatorio(),
        tabela.len(),
        impressao_digital
    );

    Ok(Resposta {
        nome_arquivo: requisicao.nome_do_relatorio(),
        conteudo,
        total_de_linhas: tabela.len(),
        impressao_digital,
        resumos,
    })
}

/// Apenas o nome do arquivo, sem diretórios.
fn nome_seguro(nome: &str) -> String {
    Path::new(nome)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "arquivo.csv".to_string())
}

fn nome_do_arquivo(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Planilhas `.xlsx` de um diretório, em ordem alfabética.
fn listar_planilhas(dir: &Path) -> InventarioResult<Vec<PathBuf>> {
    let mut planilhas: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
        })
        .collect();

    planilhas.sort();
    Ok(planilhas)
}
