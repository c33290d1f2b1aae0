//! Integration tests for the lexer + assembler pipeline
//! Tests statement classification and label resolution at the assembly boundary

use ravm_asm::Assembler;
use ravm_ast::Instruction;
use ravm_lexer::{Lexer, Token};

#[test]
fn test_full_program_assembles() {
    let source = "\
# sum countdown
1: 3;
[100]: 0;
LBL loop;
ADD 2, 6;
ADD 1, 7;
SF 1;
BIZ done;
GO loop;
LBL done;
SW 3, 2;
";
    let assembler = Assembler::new(source).unwrap();
    let assembly = assembler.assemble().unwrap();

    assert_eq!(assembly.reg_inits, vec![(1, 3)]);
    assert_eq!(assembly.mem_inits, vec![(100, 0)]);
    assert_eq!(assembly.instructions.len(), 6);
    assert_eq!(assembly.instructions[0].node, Instruction::Add(2, 6));
    assert_eq!(assembly.instructions[3].node, Instruction::Biz(4));
    assert_eq!(assembly.instructions[4].node, Instruction::Go(-1));
    assert_eq!(assembly.instructions[5].node, Instruction::Sw(3, 2));
}

#[test]
fn test_spans_point_at_statements() {
    let source = "RD;\nADD 1, 2;";
    let assembly = Assembler::new(source).unwrap().assemble().unwrap();

    assert_eq!(assembly.instructions[0].span.start, 0);
    assert_eq!(assembly.instructions[1].span.start, 4);
}

#[test]
fn test_mixed_case_and_whitespace() {
    let source = "  add   e ,  a ;\n\n\n  rd ;";
    let assembly = Assembler::new(source).unwrap().assemble().unwrap();

    assert_eq!(assembly.instructions.len(), 2);
    assert_eq!(assembly.instructions[0].node, Instruction::Add(0xE, 0xA));
    assert_eq!(assembly.instructions[1].node, Instruction::Rd);
}

#[test]
fn test_error_position_survives_pipeline() {
    let source = "RD;\nWR;\nFROB;";
    let err = Assembler::new(source).unwrap().assemble().unwrap_err();
    let rendered = format!("{err}");

    assert!(rendered.contains("ERR_UNKNOWN_OP"));
    assert!(rendered.contains(":3:1"));
}

#[test]
fn test_lexer_assembler_token_agreement() {
    // The assembler consumes exactly the token stream the lexer produces.
    let source = "SA 1; # comment";
    let tokens = Lexer::new(source).tokenize();
    assert_eq!(tokens.len(), 4); // SA, 1, semicolon, EOF
    assert_eq!(tokens[3].token, Token::Eof);

    let assembly = Assembler::new(source).unwrap().assemble().unwrap();
    assert_eq!(assembly.instructions[0].node, Instruction::Sa(1));
}

#[test]
fn test_label_on_filename_diagnostics() {
    let source = "GO missing;";
    let err = Assembler::with_filename(source, "prog.rasm")
        .unwrap()
        .assemble()
        .unwrap_err();

    assert!(format!("{err}").contains("ravm:prog.rasm:1:1"));
}
