use encoding_rs::{UTF_8, WINDOWS_1252};
use std::{
    borrow::Cow,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    ABA_DADOS, COLUNA_LOTE, COLUNAS_BOBINA, COLUNAS_PRODUTO_ACABADO, Celula, ErroLeitura,
    InventarioError, InventarioResult, LinhaProdutoAcabado, Politicas, RE_CABECALHO_DATE,
    RegistroLeitura, Tabela, TipoMaterial, escrever_planilha, interpretar_leitura, nome_de_aba,
};

/// Contagem do que aconteceu com as linhas de um arquivo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumoArquivo {
    /// Linhas gravadas na planilha (inclusive as marcadas com erro)
    pub linhas_mantidas: usize,
    pub cabecalhos_descartados: usize,
    /// Registros sem nenhum valor (`,,,,`) ou que resultariam em linha vazia
    pub linhas_vazias_descartadas: usize,
    pub linhas_curtas_descartadas: usize,
    pub simbologias_descartadas: usize,
    pub erros: BTreeMap<ErroLeitura, usize>,
}

impl ResumoArquivo {
    fn registrar_erro(&mut self, erro: ErroLeitura) {
        *self.erros.entry(erro).or_default() += 1;
    }

    pub fn total_de_erros(&self) -> usize {
        self.erros.values().sum()
    }
}

/// Planilha intermediária gerada para um arquivo CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct ArquivoConvertido {
    pub origem: PathBuf,
    pub destino: PathBuf,
    pub resumo: ResumoArquivo,
}

/// Decodifica o conteúdo do arquivo: UTF-8 (sem BOM) ou, se inválido, Latin-1.
///
/// ### Exemplo
/// ```
/// use conversor_inventario::decodificar_texto;
///
/// assert_eq!(decodificar_texto("Localização".as_bytes()), "Localização");
/// assert_eq!(decodificar_texto(b"Localiza\xe7\xe3o"), "Localização");
/// ```
pub fn decodificar_texto(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(texto) => texto,
        None => {
            debug!("Conteúdo não é UTF-8 válido: usando Latin-1");
            WINDOWS_1252.decode_without_bom_handling(bytes).0
        }
    }
}

/// Lê o CSV sem cabeçalho; cada linha pode ter qualquer número de campos.
fn ler_registros(texto: &str, arquivo: &Path) -> InventarioResult<Vec<csv::StringRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(texto.as_bytes());

    rdr.records()
        .map(|result| result.map_err(|e| InventarioError::from_csv(e, arquivo.to_path_buf())))
        .collect()
}

/// Linhas de cabeçalho repetidas no meio do arquivo contêm "date".
fn eh_cabecalho_embutido(campos: &[&str]) -> bool {
    RE_CABECALHO_DATE.is_match(&campos.join(" "))
}

fn eh_registro_vazio(campos: &[&str]) -> bool {
    campos.iter().all(|campo| campo.is_empty())
}

/// Uma linha sem nenhum valor não sobrevive à releitura da planilha.
fn eh_linha_vazia(celulas: &[Celula]) -> bool {
    celulas.iter().all(|celula| celula.to_string().is_empty())
}

/// Normaliza um arquivo do fluxo "Bobina".
///
/// Colunas: `Data da Leitura, Hora da Leitura, Lote, Peso`. O lote é sempre texto.
pub fn normalizar_bobina(
    bytes: &[u8],
    arquivo: &Path,
    politicas: &Politicas,
) -> InventarioResult<(Tabela, ResumoArquivo)> {
    let texto = decodificar_texto(bytes);
    let registros = ler_registros(&texto, arquivo)?;

    let mut tabela = Tabela::new(COLUNAS_BOBINA);
    let mut resumo = ResumoArquivo::default();

    for record in &registros {
        let campos: Vec<&str> = record.iter().collect();

        // 1. Registros em branco e cabeçalhos embutidos
        if eh_registro_vazio(&campos) {
            resumo.linhas_vazias_descartadas += 1;
            continue;
        }
        if eh_cabecalho_embutido(&campos) {
            resumo.cabecalhos_descartados += 1;
            continue;
        }

        // 2. Linhas curtas
        let Some(registro) = RegistroLeitura::from_campos(&campos) else {
            resumo.linhas_curtas_descartadas += 1;
            continue;
        };

        // 3. Interpretação (o erro só propaga com PoliticaData::AbortarArquivo)
        match interpretar_leitura(&registro, politicas)? {
            Some(linha) => {
                let erro = linha.erro();
                let celulas = linha.into_celulas();

                if eh_linha_vazia(&celulas) {
                    resumo.linhas_vazias_descartadas += 1;
                    continue;
                }
                if let Some(erro) = erro {
                    resumo.registrar_erro(erro);
                }
                tabela.push_linha(celulas);
            }
            None => resumo.simbologias_descartadas += 1,
        }
    }

    if tabela.is_empty() {
        return Err(InventarioError::ArquivoSemDados {
            arquivo: arquivo.to_path_buf(),
        });
    }

    resumo.linhas_mantidas = tabela.len();
    Ok((tabela.mapear_coluna(COLUNA_LOTE, Celula::como_texto), resumo))
}

/// Normaliza um arquivo do fluxo "Produto Acabado" (código composto expandido).
///
/// Registros em branco e cabeçalhos ("Date,...") são descartados e contados à parte.
pub fn normalizar_produto_acabado(
    bytes: &[u8],
    arquivo: &Path,
) -> InventarioResult<(Tabela, ResumoArquivo)> {
    let texto = decodificar_texto(bytes);
    let registros = ler_registros(&texto, arquivo)?;

    let mut tabela = Tabela::new(COLUNAS_PRODUTO_ACABADO);
    let mut resumo = ResumoArquivo::default();

    for record in &registros {
        let campos: Vec<&str> = record.iter().collect();

        if eh_registro_vazio(&campos) {
            resumo.linhas_vazias_descartadas += 1;
            continue;
        }
        if eh_cabecalho_embutido(&campos) {
            resumo.cabecalhos_descartados += 1;
            continue;
        }

        let Some(linha) = LinhaProdutoAcabado::from_campos(&campos) else {
            resumo.linhas_curtas_descartadas += 1;
            continue;
        };

        if let Err(erro) = &linha.campos {
            resumo.registrar_erro(*erro);
        }
        tabela.push_linha(linha.into_celulas());
    }

    if tabela.is_empty() {
        return Err(InventarioError::ArquivoSemDados {
            arquivo: arquivo.to_path_buf(),
        });
    }

    resumo.linhas_mantidas = tabela.len();
    Ok((tabela, resumo))
}

/// Nome do arquivo sem extensão
pub fn nome_base(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Primeiro `<base>.xlsx` livre no diretório: `<base> (2).xlsx`, `<base> (3).xlsx`, ...
///
/// Nomes que diferem apenas na extensão (`Rua A.csv` e `Rua A.CSV`) têm o mesmo nome base.
fn destino_livre(pasta: &Path, base: &str) -> (String, PathBuf) {
    let mut nome = base.to_string();
    let mut n = 2;

    loop {
        let destino = pasta.join(format!("{nome}.xlsx"));
        if !destino.exists() {
            return (nome, destino);
        }
        nome = format!("{base} ({n})");
        n += 1;
    }
}

/// Converte um CSV em `<destino>/<nome base>.xlsx`.
///
/// Aba `Dados` (Bobina) ou aba com o nome base do arquivo (Produto Acabado).
/// Um nome base já usado recebe o sufixo ` (n)`.
pub fn converter_arquivo(
    csv_path: &Path,
    pasta_destino: &Path,
    tipo: TipoMaterial,
    politicas: &Politicas,
) -> InventarioResult<ArquivoConvertido> {
    let bytes = fs::read(csv_path).map_err(|e| InventarioError::IoReader {
        source: e,
        arquivo: csv_path.to_path_buf(),
    })?;

    let original = nome_base(csv_path);
    let (base, destino) = destino_livre(pasta_destino, &original);
    if base != original {
        warn!(
            "Arquivo <{}> gravado como <{}>: nome base repetido",
            csv_path.display(),
            destino.display()
        );
    }

    let (tabela, resumo, aba) = match tipo {
        TipoMaterial::Bobina => {
            let (tabela, resumo) = normalizar_bobina(&bytes, csv_path, politicas)?;
            (tabela, resumo, ABA_DADOS.to_string())
        }
        TipoMaterial::ProdutoAcabado => {
            let (tabela, resumo) = normalizar_produto_acabado(&bytes, csv_path)?;
            (tabela, resumo, nome_de_aba(&base))
        }
    };

    escrever_planilha(&destino, &[(aba.as_str(), &tabela)])?;

    info!(
        "Arquivo <{}> convertido: {} linhas mantidas, {} com erro de leitura",
        csv_path.display(),
        resumo.linhas_mantidas,
        resumo.total_de_erros()
    );

    Ok(ArquivoConvertido {
        origem: csv_path.to_path_buf(),
        destino,
        resumo,
    })
}
