use std::cell::RefCell;

use chrono::NaiveDate;
use conversor_inventario::{
    ArquivoEnviado, Celula, ErroLeitura, InventarioError, Notificador, Politicas, Requisicao,
    Resposta, Tabela, TipoMaterial, executar, ler_planilha, logging,
};
use tempfile::tempdir;

/// Guarda as mensagens recebidas, por tipo.
#[derive(Default)]
struct Coletor {
    avisos: RefCell<Vec<String>>,
    erros: RefCell<Vec<String>>,
    sucessos: RefCell<Vec<String>>,
}

impl Notificador for Coletor {
    fn progresso(&self, _msg: &str) {}

    fn aviso(&self, msg: &str) {
        self.avisos.borrow_mut().push(msg.to_string());
    }

    fn sucesso(&self, msg: &str) {
        self.sucessos.borrow_mut().push(msg.to_string());
    }

    fn erro(&self, msg: &str) {
        self.erros.borrow_mut().push(msg.to_string());
    }
}

fn arquivo(nome: &str, conteudo: &[u8]) -> ArquivoEnviado {
    ArquivoEnviado {
        nome: nome.to_string(),
        conteudo: conteudo.to_vec(),
    }
}

fn requisicao(tipo: TipoMaterial, arquivos: Vec<ArquivoEnviado>) -> Requisicao {
    Requisicao {
        tipo_material: tipo,
        grupo: "Chapas".to_string(),
        data: NaiveDate::from_ymd_opt(2024, 3, 5),
        arquivos,
        politicas: Politicas::default(),
    }
}

/// Relê o relatório gerado: (nome da aba, tabela).
fn ler_relatorio(resposta: &Resposta) -> (String, Tabela) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(&resposta.nome_arquivo);
    std::fs::write(&path, &resposta.conteudo).unwrap();

    let aba = ler_planilha(&path).unwrap().into_iter().next().unwrap();
    (aba.nome.clone(), aba.into_tabela(1))
}

fn valor(tabela: &Tabela, linha: usize, coluna: &str) -> Celula {
    tabela.linhas()[linha][tabela.indice_coluna(coluna).unwrap()].clone()
}

const RUA_A: &[u8] = b"\
Date,Time,Reg,Type,Data
03-15-2024,08:00:01,1,Code128,*A*1500*000123
03-15-2024,08:00:02,2,QR,A-B-C-LOT3-2750
";

const RUA_B: &[u8] = b"\
03-16-2024,09:00:01,1,Code128,00 42
03-16-2024,09:00:02,2,CODE_39,000777
";

#[test]
fn bobina_gera_relatorio_unificado() {
    logging::init_test();

    let coletor = Coletor::default();
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![arquivo("Rua B.csv", RUA_B), arquivo("Rua A.csv", RUA_A)],
    );

    let resposta = executar(&req, &coletor).unwrap();
    assert_eq!(resposta.nome_arquivo, "Inventario Chapas 05-03-24.xlsx");
    assert_eq!(resposta.total_de_linhas, 4);
    assert_eq!(coletor.sucessos.borrow().len(), 1);
    assert!(coletor.avisos.borrow().is_empty());

    let (aba, tabela) = ler_relatorio(&resposta);
    assert_eq!(aba, "Inventario_Unificado");
    assert_eq!(
        tabela.colunas(),
        ["Data da Leitura", "Hora da Leitura", "Lote", "Peso", "Localização"]
    );
    assert_eq!(tabela.len(), 4);

    // Arquivos processados em ordem alfabética
    assert_eq!(valor(&tabela, 0, "Lote"), Celula::texto("000123"));
    assert_eq!(valor(&tabela, 0, "Peso"), Celula::Numero(1.5));
    assert_eq!(valor(&tabela, 0, "Localização"), Celula::texto("Rua A"));
    assert_eq!(valor(&tabela, 1, "Data da Leitura"), Celula::texto("15/03/2024"));
    assert_eq!(valor(&tabela, 1, "Lote"), Celula::texto("LOT3"));
    assert_eq!(valor(&tabela, 1, "Peso"), Celula::Numero(2.75));
    assert_eq!(valor(&tabela, 2, "Lote"), Celula::texto("erro de leitura"));
    assert_eq!(valor(&tabela, 2, "Peso"), Celula::texto("erro de leitura"));
    assert_eq!(valor(&tabela, 3, "Lote"), Celula::texto("000777"));
    assert_eq!(valor(&tabela, 3, "Localização"), Celula::texto("Rua B"));

    let resumos: Vec<&str> = resposta.resumos.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(resumos, ["Rua A.csv", "Rua B.csv"]);
    assert_eq!(resposta.resumos[0].1.cabecalhos_descartados, 1);
    assert_eq!(resposta.resumos[1].1.erros.get(&ErroLeitura::Leitura), Some(&1));
}

#[test]
fn mesma_entrada_mesma_impressao_digital() {
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![arquivo("Rua A.csv", RUA_A), arquivo("Rua B.csv", RUA_B)],
    );

    let primeira = executar(&req, &Coletor::default()).unwrap();
    let segunda = executar(&req, &Coletor::default()).unwrap();

    assert_eq!(primeira.impressao_digital, segunda.impressao_digital);
    assert_eq!(primeira.total_de_linhas, segunda.total_de_linhas);
}

#[test]
fn bobina_aceita_latin1() {
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![arquivo(
            "Galpao.csv",
            b"03-15-2024,08:00:01,1,Code128,A\xc7O1\n",
        )],
    );

    let resposta = executar(&req, &Coletor::default()).unwrap();
    let (_, tabela) = ler_relatorio(&resposta);
    assert_eq!(valor(&tabela, 0, "Lote"), Celula::texto("AÇO1"));
}

#[test]
fn produto_acabado_gera_relatorio_consolidado() {
    let camara: &[u8] = b"\
15/03/2024,08:30:00,7,L01,3-0012345 -1500-A-20240315-1030,MATRIZ
15/03/2024,08:31:00,8,L01,1-L-1500-A-D-H,MATRIZ
";
    let expedicao: &[u8] = b"16/03/2024,10:00:00,1,L02,12-0042 -2250-B-20240316-1000-X,FILIAL 2\n";

    let coletor = Coletor::default();
    let req = requisicao(
        TipoMaterial::ProdutoAcabado,
        vec![arquivo("Camara.csv", camara), arquivo("Expedicao.csv", expedicao)],
    );

    let resposta = executar(&req, &coletor).unwrap();
    assert_eq!(resposta.total_de_linhas, 3);

    let (aba, tabela) = ler_relatorio(&resposta);
    assert_eq!(aba, "Inventario_Consolidado");
    assert_eq!(tabela.colunas().len(), 15);
    assert_eq!(tabela.colunas().last().map(String::as_str), Some("Localizacao"));

    assert_eq!(valor(&tabela, 0, "Armazem"), Celula::texto("03"));
    assert_eq!(valor(&tabela, 0, "Lote"), Celula::texto("0012345"));
    assert_eq!(valor(&tabela, 0, "Peso"), Celula::Numero(1.5));
    assert_eq!(valor(&tabela, 0, "Filial"), Celula::texto("MATRIZ"));
    assert_eq!(valor(&tabela, 0, "Localizacao"), Celula::texto("Camara"));

    // Código composto malformado: marcador nas colunas derivadas
    assert_eq!(valor(&tabela, 1, "Lote"), Celula::texto("erro Código/-"));
    assert_eq!(valor(&tabela, 1, "Código"), Celula::texto("1-L-1500-A-D-H"));

    assert_eq!(valor(&tabela, 2, "Armazem"), Celula::texto("12"));
    assert_eq!(valor(&tabela, 2, "Peso"), Celula::Numero(2.25));
    assert_eq!(valor(&tabela, 2, "Coluna 8"), Celula::texto("X"));
    assert_eq!(valor(&tabela, 2, "Localizacao"), Celula::texto("Expedicao"));
}

#[test]
fn grupo_vazio_e_rejeitado() {
    let coletor = Coletor::default();
    let mut req = requisicao(TipoMaterial::Bobina, vec![arquivo("Rua A.csv", RUA_A)]);
    req.grupo = "   ".to_string();

    assert!(matches!(
        executar(&req, &coletor),
        Err(InventarioError::GrupoVazio)
    ));
    assert_eq!(coletor.erros.borrow().len(), 1);
}

#[test]
fn sem_arquivos_e_rejeitado() {
    let req = requisicao(TipoMaterial::Bobina, Vec::new());
    assert!(matches!(
        executar(&req, &Coletor::default()),
        Err(InventarioError::NenhumArquivoEnviado)
    ));
}

#[test]
fn apenas_arquivos_que_nao_sao_csv() {
    let req = requisicao(TipoMaterial::Bobina, vec![arquivo("notas.txt", RUA_A)]);
    assert!(matches!(
        executar(&req, &Coletor::default()),
        Err(InventarioError::NenhumCsvEncontrado)
    ));
}

#[test]
fn nenhum_arquivo_valido_nao_gera_relatorio() {
    let coletor = Coletor::default();
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![
            arquivo("vazio.csv", b"Date,Time,Reg,Type,Data\n"),
            arquivo("curto.csv", b"03-15-2024,08:00:01\n"),
        ],
    );

    assert!(matches!(
        executar(&req, &coletor),
        Err(InventarioError::NenhumArquivoIntermediario)
    ));
    assert_eq!(coletor.avisos.borrow().len(), 2);
    assert_eq!(coletor.erros.borrow().len(), 1);
    assert!(coletor.sucessos.borrow().is_empty());
}

#[test]
fn arquivo_ruim_e_ignorado_e_os_demais_seguem() {
    let coletor = Coletor::default();
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![arquivo("Rua A.csv", RUA_A), arquivo("vazio.csv", b"")],
    );

    let resposta = executar(&req, &coletor).unwrap();
    assert_eq!(resposta.total_de_linhas, 2);
    assert_eq!(coletor.avisos.borrow().len(), 1);
    assert!(coletor.avisos.borrow()[0].contains("vazio.csv"));
}

#[test]
fn total_do_relatorio_igual_a_soma_das_linhas_mantidas() {
    let com_brancos: &[u8] = b"\
03-15-2024,08:00:01,1,Code128,X*2000*LOT5
,,,,
03-15-2024,08:00:03,3,Code128,00123
";
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![arquivo("Rua A.csv", RUA_A), arquivo("Brancos.csv", com_brancos)],
    );

    let resposta = executar(&req, &Coletor::default()).unwrap();
    let mantidas: usize = resposta
        .resumos
        .iter()
        .map(|(_, resumo)| resumo.linhas_mantidas)
        .sum();

    assert_eq!(mantidas, resposta.total_de_linhas);
    assert_eq!(resposta.total_de_linhas, 4);

    let (_, tabela) = ler_relatorio(&resposta);
    assert_eq!(tabela.len(), resposta.total_de_linhas);
}

#[test]
fn produto_acabado_total_igual_a_soma_das_linhas_mantidas() {
    let camara: &[u8] = b"\
Date,Time,Reg,Reader,Code,Filial
15/03/2024,08:30:00,7,L01,3-0012345 -1500-A-20240315-1030,MATRIZ
,,,,,
";
    let req = requisicao(
        TipoMaterial::ProdutoAcabado,
        vec![arquivo("Camara.csv", camara)],
    );

    let resposta = executar(&req, &Coletor::default()).unwrap();
    assert_eq!(resposta.total_de_linhas, 1);
    assert_eq!(resposta.resumos[0].1.linhas_mantidas, 1);
    assert_eq!(resposta.resumos[0].1.total_de_erros(), 0);
}

#[test]
fn arquivos_com_mesmo_nome_base_sao_todos_mantidos() {
    let req = requisicao(
        TipoMaterial::Bobina,
        vec![arquivo("Rua A.csv", RUA_A), arquivo("Rua A.CSV", RUA_B)],
    );

    let resposta = executar(&req, &Coletor::default()).unwrap();
    assert_eq!(resposta.resumos.len(), 2);
    assert_eq!(resposta.total_de_linhas, 4);

    let (_, tabela) = ler_relatorio(&resposta);
    let mut origens: Vec<String> = tabela
        .coluna("Localização")
        .unwrap()
        .map(|c| c.to_string())
        .collect();
    origens.dedup();
    origens.sort();
    assert_eq!(origens, ["Rua A", "Rua A (2)"]);
}
