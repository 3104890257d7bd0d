use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{Celula, InventarioError, InventarioResult, MIN_CAMPOS_REGISTRO};

/// Resultado de um campo interpretado: valor (possivelmente ausente) ou o motivo da falha.
pub type Campo<T> = Result<T, ErroLeitura>;

/// Falhas de interpretação de uma leitura.
///
/// A mensagem de cada variante é o marcador gravado na planilha final, no lugar
/// do lote e do peso, para que a leitura possa ser corrigida manualmente.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErroLeitura {
    #[error("erro de leitura")]
    Leitura,

    #[error("erro Code128/*")]
    Code128Asterisco,

    #[error("erro QR/JSON")]
    QrJson,

    #[error("erro QR/-")]
    QrHifen,

    #[error("erro de data")]
    Data,

    #[error("erro simbologia")]
    SimbologiaDesconhecida,

    #[error("erro Código/-")]
    CodigoComposto,
}

/// Tipo de código lido pelo coletor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simbologia {
    /// `Code128`: formatos com `*`, peso puro ou lote puro
    Code128,
    /// `CODE_39` ou `CODE_128`: o conteúdo é o lote
    CodigoDeBarras,
    /// `QR_CODE` ou `QR`: JSON embutido ou campos separados por `-`
    Qr,
    Desconhecida,
}

impl From<&str> for Simbologia {
    /// A comparação diferencia maiúsculas de minúsculas: `Code128` != `CODE_128`.
    fn from(tag: &str) -> Self {
        match tag {
            "Code128" => Simbologia::Code128,
            "CODE_39" | "CODE_128" => Simbologia::CodigoDeBarras,
            "QR_CODE" | "QR" => Simbologia::Qr,
            _ => Simbologia::Desconhecida,
        }
    }
}

/// O que fazer com leituras de simbologia não reconhecida.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PoliticaSimbologia {
    /// Manter a linha com lote e peso vazios
    #[default]
    Vazio,
    /// Descartar a linha
    Descartar,
    /// Marcar lote e peso com "erro simbologia"
    Erro,
}

/// O que fazer quando a data de uma leitura CODE_39/CODE_128/QR não está em MM-DD-AAAA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PoliticaData {
    /// Marcar lote e peso da linha com "erro de data"
    #[default]
    #[value(name = "linha")]
    ErroNaLinha,
    /// Abortar o arquivo inteiro (que é ignorado com um aviso)
    #[value(name = "arquivo")]
    AbortarArquivo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Politicas {
    pub simbologia: PoliticaSimbologia,
    pub data: PoliticaData,
}

/// Registro bruto do coletor: data, hora, registro (ignorado), simbologia, conteúdo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistroLeitura<'a> {
    pub data_leitura: &'a str,
    pub hora_leitura: &'a str,
    pub simbologia: &'a str,
    pub conteudo: &'a str,
}

impl<'a> RegistroLeitura<'a> {
    /// Retorna `None` para linhas com menos de 5 campos.
    pub fn from_campos(campos: &[&'a str]) -> Option<Self> {
        if campos.len() < MIN_CAMPOS_REGISTRO {
            return None;
        }

        Some(RegistroLeitura {
            data_leitura: campos[0],
            hora_leitura: campos[1],
            simbologia: campos[3],
            conteudo: campos[4],
        })
    }
}

/// Linha normalizada do fluxo "Bobina".
///
/// Em caso de falha, `lote` e `peso` carregam o mesmo `ErroLeitura`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinhaNormalizada {
    pub data_leitura: String,
    pub hora_leitura: String,
    pub lote: Campo<Option<String>>,
    pub peso: Campo<Option<f64>>,
}

impl LinhaNormalizada {
    fn new(data_leitura: &str, hora_leitura: &str) -> Self {
        LinhaNormalizada {
            data_leitura: data_leitura.to_string(),
            hora_leitura: hora_leitura.to_string(),
            lote: Ok(None),
            peso: Ok(None),
        }
    }

    /// Lote e peso são atribuídos juntos: ambos com valor ou ambos com o mesmo erro.
    fn com_resultado(self, resultado: Campo<(Option<String>, Option<f64>)>) -> Self {
        let (lote, peso) = match resultado {
            Ok((lote, peso)) => (Ok(lote), Ok(peso)),
            Err(erro) => (Err(erro), Err(erro)),
        };

        LinhaNormalizada { lote, peso, ..self }
    }

    pub fn erro(&self) -> Option<ErroLeitura> {
        self.lote.as_ref().err().or(self.peso.as_ref().err()).copied()
    }

    /// Células na ordem de `COLUNAS_BOBINA`.
    ///
    /// É aqui que os erros viram marcadores de texto. O lote é sempre texto
    /// (vazio quando ausente) para não perder zeros à esquerda.
    pub fn into_celulas(self) -> Vec<Celula> {
        let lote = match self.lote {
            Ok(lote) => Celula::Texto(lote.unwrap_or_default()),
            Err(erro) => Celula::Texto(erro.to_string()),
        };

        let peso = match self.peso {
            Ok(peso) => Celula::from(peso),
            Err(erro) => Celula::Texto(erro.to_string()),
        };

        vec![
            Celula::Texto(self.data_leitura),
            Celula::Texto(self.hora_leitura),
            lote,
            peso,
        ]
    }
}

/// Interpreta um registro do coletor no fluxo "Bobina".
///
/// Retorna `Ok(None)` apenas quando a simbologia é desconhecida e a política é
/// `Descartar`. Retorna `Err` apenas quando a data é inválida e a política é
/// `AbortarArquivo`. Todas as demais falhas ficam registradas na própria linha.
///
/// ### Exemplo
/// ```
/// use conversor_inventario::{Politicas, RegistroLeitura, interpretar_leitura};
///
/// let registro = RegistroLeitura {
///     data_leitura: "03-15-2024",
///     hora_leitura: "10:00:00",
///     simbologia: "QR",
///     conteudo: "A-B-C-LOT3-2750",
/// };
///
/// let linha = interpretar_leitura(&registro, &Politicas::default())
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(linha.data_leitura, "15/03/2024");
/// assert_eq!(linha.lote, Ok(Some("LOT3".to_string())));
/// assert_eq!(linha.peso, Ok(Some(2.75)));
/// ```
pub fn interpretar_leitura(
    registro: &RegistroLeitura,
    politicas: &Politicas,
) -> InventarioResult<Option<LinhaNormalizada>> {
    let simbologia = registro.simbologia.trim();
    let conteudo = registro.conteudo.trim();
    let mut linha = LinhaNormalizada::new(registro.data_leitura, registro.hora_leitura);

    let tipo = Simbologia::from(simbologia);

    let linha = match tipo {
        Simbologia::Code128 => linha.com_resultado(interpretar_code128(conteudo)),
        Simbologia::CodigoDeBarras | Simbologia::Qr => {
            let Some(data) = reformatar_data(&linha.data_leitura) else {
                return tratar_data_invalida(linha, politicas.data);
            };
            linha.data_leitura = data;

            if tipo == Simbologia::Qr {
                linha.com_resultado(interpretar_qr(conteudo))
            } else {
                linha.com_resultado(Ok((Some(conteudo.to_string()), None)))
            }
        }
        Simbologia::Desconhecida => match politicas.simbologia {
            PoliticaSimbologia::Vazio => linha,
            PoliticaSimbologia::Descartar => {
                debug!("Simbologia <{simbologia}> desconhecida: linha descartada");
                return Ok(None);
            }
            PoliticaSimbologia::Erro => {
                linha.com_resultado(Err(ErroLeitura::SimbologiaDesconhecida))
            }
        },
    };

    if let Some(erro) = linha.erro() {
        debug!("Leitura <{simbologia}> <{conteudo}> marcada como <{erro}>");
    }

    Ok(Some(linha))
}

fn tratar_data_invalida(
    linha: LinhaNormalizada,
    politica: PoliticaData,
) -> InventarioResult<Option<LinhaNormalizada>> {
    match politica {
        PoliticaData::ErroNaLinha => {
            debug!("Data <{}> inválida: linha marcada", linha.data_leitura);
            Ok(Some(linha.com_resultado(Err(ErroLeitura::Data))))
        }
        PoliticaData::AbortarArquivo => Err(InventarioError::DataInvalida {
            valor: linha.data_leitura,
        }),
    }
}

/// `MM-DD-AAAA` -> `DD/MM/AAAA`
pub fn reformatar_data(data: &str) -> Option<String> {
    NaiveDate::parse_from_str(data.trim(), "%m-%d-%Y")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}

/// Converte texto em número finito, tolerando espaços nas pontas.
///
/// `inf`, `NaN` e literais fora da faixa (`1e400`) não são pesos válidos.
fn converter_numero(texto: &str) -> Option<f64> {
    texto
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn interpretar_code128(conteudo: &str) -> Campo<(Option<String>, Option<f64>)> {
    // Espaço no conteúdo indica leitura corrompida
    if conteudo.contains(' ') {
        return Err(ErroLeitura::Leitura);
    }

    if conteudo.contains('*') {
        let partes: Vec<&str> = conteudo.split('*').map(str::trim).collect();

        // "*X*peso*lote" (4 partes) ou "X*peso*lote" (3 partes)
        let (idx_lote, idx_peso) = if conteudo.starts_with('*') {
            (3, 2)
        } else {
            (2, 1)
        };

        let lote = partes.get(idx_lote).ok_or(ErroLeitura::Code128Asterisco)?;
        let gramas = partes
            .get(idx_peso)
            .and_then(|p| converter_numero(p))
            .ok_or(ErroLeitura::Code128Asterisco)?;

        return Ok((Some(lote.to_string()), Some(gramas / 1000.0)));
    }

    // Peso puro em gramas: até 5 dígitos
    if !conteudo.is_empty() && conteudo.len() <= 5 && conteudo.bytes().all(|b| b.is_ascii_digit())
    {
        let gramas: u32 = conteudo.parse().map_err(|_| ErroLeitura::Leitura)?;
        return Ok((None, Some(f64::from(gramas) / 1000.0)));
    }

    Ok((Some(conteudo.to_string()), None))
}

fn interpretar_qr(conteudo: &str) -> Campo<(Option<String>, Option<f64>)> {
    if conteudo.contains('{') && conteudo.contains('}') {
        interpretar_qr_json(conteudo)
    } else {
        interpretar_qr_hifen(conteudo)
    }
}

/// `"LOTE-{"peso": 3.5, ...}` -> lote `LOTE`, peso 3.5 (kg, sem conversão)
fn interpretar_qr_json(conteudo: &str) -> Campo<(Option<String>, Option<f64>)> {
    let (prefixo, resto) = conteudo.split_once('{').ok_or(ErroLeitura::QrJson)?;
    let identificador = prefixo.trim_matches(|c| c == '"' || c == '-');

    let json: Value =
        serde_json::from_str(&format!("{{{resto}")).map_err(|_| ErroLeitura::QrJson)?;
    let objeto = json.as_object().ok_or(ErroLeitura::QrJson)?;

    let peso = match objeto.get("peso") {
        None => 0.0,
        Some(Value::Number(n)) => n.as_f64().ok_or(ErroLeitura::QrJson)?,
        Some(Value::String(s)) => converter_numero(s).ok_or(ErroLeitura::QrJson)?,
        Some(_) => return Err(ErroLeitura::QrJson),
    };

    Ok((Some(identificador.to_string()), Some(peso)))
}

/// `A-B-LOTE-...-GRAMAS` -> lote no 4º campo, peso no último
fn interpretar_qr_hifen(conteudo: &str) -> Campo<(Option<String>, Option<f64>)> {
    let partes: Vec<&str> = conteudo.split('-').collect();

    let lote = partes.get(3).map(|l| l.trim()).ok_or(ErroLeitura::QrHifen)?;
    let gramas = partes
        .last()
        .and_then(|p| converter_numero(p))
        .ok_or(ErroLeitura::QrHifen)?;

    Ok((Some(lote.to_string()), Some(gramas / 1000.0)))
}
