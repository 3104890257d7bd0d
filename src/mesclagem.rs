use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    Aba, COLUNA_ARMAZEM, COLUNA_LOCALIZACAO_BOBINA, COLUNA_LOCALIZACAO_PRODUTO, COLUNA_LOTE,
    COLUNA_PESO, Celula, InventarioError, InventarioResult, MAX_NOME_ABA, Notificador,
    RE_CABECALHO_DATE, RE_SOMENTE_DIGITOS, Tabela, escrever_planilha, ler_planilha, nome_base,
    nome_de_aba,
};

/// Lê a primeira aba de uma planilha intermediária.
fn ler_primeira_aba(path: &Path) -> InventarioResult<Aba> {
    ler_planilha(path)?
        .into_iter()
        .next()
        .ok_or_else(|| InventarioError::PlanilhaSemAbas {
            arquivo: path.to_path_buf(),
        })
}

fn avisar_leitura(notificador: &dyn Notificador, path: &Path, erro: &InventarioError) {
    let msg = format!(
        "Erro ao ler o arquivo intermediário {}. Erro: {erro}",
        path.display()
    );
    warn!("{msg}");
    notificador.aviso(&msg);
}

// --- Fluxo "Bobina" ---

/// Concatena as planilhas intermediárias do fluxo "Bobina".
///
/// Cada linha recebe a coluna `Localização` com o nome base do arquivo de origem.
/// Planilhas ilegíveis são ignoradas com um aviso.
pub fn mesclar_bobina(
    planilhas: &[PathBuf],
    notificador: &dyn Notificador,
) -> InventarioResult<Tabela> {
    let tabelas: Vec<Tabela> = planilhas
        .iter()
        .filter_map(|path| match ler_primeira_aba(path) {
            Ok(aba) => Some(
                aba.into_tabela(1)
                    .mapear_coluna(COLUNA_LOTE, Celula::como_texto)
                    .com_procedencia(COLUNA_LOCALIZACAO_BOBINA, &nome_base(path)),
            ),
            Err(erro) => {
                avisar_leitura(notificador, path, &erro);
                None
            }
        })
        .collect();

    // A concatenação pode misturar tipos na coluna do lote: nova conversão para texto
    let tabela = Tabela::concatenar(tabelas).mapear_coluna(COLUNA_LOTE, Celula::como_texto);

    if tabela.is_empty() {
        return Err(InventarioError::NenhumDadoLido);
    }

    info!("{} linhas unificadas (Bobina)", tabela.len());
    Ok(tabela)
}

// --- Fluxo "Produto Acabado" ---

/// Nome de aba ainda não usado (a comparação ignora maiúsculas).
fn nome_unico(base: String, usados: &mut HashSet<String>) -> String {
    if usados.insert(base.to_lowercase()) {
        return base;
    }

    let mut n = 2;
    loop {
        let sufixo = format!(" ({n})");
        let raiz: String = base
            .chars()
            .take(MAX_NOME_ABA - sufixo.chars().count())
            .collect();
        let nome = format!("{raiz}{sufixo}");

        if usados.insert(nome.to_lowercase()) {
            return nome;
        }
        n += 1;
    }
}

/// Etapa 1: reúne as planilhas intermediárias em uma única planilha,
/// uma aba por arquivo de origem (nome base truncado em 31 caracteres).
///
/// Retorna o número de abas gravadas.
pub fn reunir_abas(
    planilhas: &[PathBuf],
    destino: &Path,
    notificador: &dyn Notificador,
) -> InventarioResult<usize> {
    let mut usados = HashSet::new();
    let mut abas: Vec<(String, Tabela)> = Vec::new();

    for path in planilhas {
        match ler_primeira_aba(path) {
            Ok(aba) => {
                let nome = nome_unico(nome_de_aba(&nome_base(path)), &mut usados);
                abas.push((nome, aba.into_tabela(1)));
            }
            Err(erro) => avisar_leitura(notificador, path, &erro),
        }
    }

    if abas.is_empty() {
        return Err(InventarioError::NenhumDadoLido);
    }

    let refs: Vec<(&str, &Tabela)> = abas
        .iter()
        .map(|(nome, tabela)| (nome.as_str(), tabela))
        .collect();
    escrever_planilha(destino, &refs)?;

    info!("{} abas reunidas em <{}>", abas.len(), destino.display());
    Ok(abas.len())
}

/// A célula A2 contém "date": a segunda linha é um cabeçalho secundário.
fn tem_cabecalho_secundario(aba: &Aba) -> bool {
    aba.linhas
        .get(1)
        .and_then(|linha| linha.first())
        .is_some_and(|a2| RE_CABECALHO_DATE.is_match(&a2.to_string()))
}

/// Células preenchidas viram texto; vazias continuam vazias.
fn sem_tipo(celula: &Celula) -> Celula {
    match celula {
        Celula::Vazia => Celula::Vazia,
        outra => outra.como_texto(),
    }
}

/// Armazém numérico com 2 dígitos: "3" -> "03"
fn normalizar_armazem(celula: &Celula) -> Celula {
    match celula {
        Celula::Texto(s) if RE_SOMENTE_DIGITOS.is_match(s) => Celula::Texto(format!("{s:0>2}")),
        outra => outra.clone(),
    }
}

/// Peso com vírgula decimal -> número; texto inválido fica vazio.
fn normalizar_peso(celula: &Celula) -> Celula {
    match celula {
        Celula::Texto(s) => s
            .replacen(',', ".", 1)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or(Celula::Vazia, Celula::Numero),
        outra => outra.clone(),
    }
}

/// Etapa 2: consolida todas as abas em uma única tabela.
///
/// As células são lidas como texto (sem perder zeros à esquerda) e cada linha
/// recebe a coluna `Localizacao` com o nome da aba de origem.
pub fn consolidar_abas(planilha: &Path) -> InventarioResult<Tabela> {
    let tabelas: Vec<Tabela> = ler_planilha(planilha)?
        .into_iter()
        .map(|aba| {
            let inicio_dados = if tem_cabecalho_secundario(&aba) { 2 } else { 1 };
            let nome = aba.nome.clone();

            let tabela = aba.into_tabela(inicio_dados);
            let colunas: Vec<String> = tabela.colunas().to_vec();

            colunas
                .iter()
                .fold(tabela, |t, coluna| t.mapear_coluna(coluna, sem_tipo))
                .com_procedencia(COLUNA_LOCALIZACAO_PRODUTO, &nome)
        })
        .collect();

    let tabela = Tabela::concatenar(tabelas)
        .mapear_coluna(COLUNA_ARMAZEM, normalizar_armazem)
        .mapear_coluna(COLUNA_LOTE, Celula::como_texto)
        .mapear_coluna(COLUNA_PESO, normalizar_peso);

    if tabela.is_empty() {
        return Err(InventarioError::NenhumDadoLido);
    }

    info!("{} linhas consolidadas (Produto Acabado)", tabela.len());
    Ok(tabela)
}
