use hypred::syntax::{BufferedVisitor, ParenPrinter, Token, TreeVisitor, XmlPrinter, paren, xml};

fn paren_tokens(src: &str) -> Vec<Token> {
    let mut buffer = BufferedVisitor::new();
    paren::parse(src, &mut buffer).expect("paren source should parse");
    buffer.into_tokens()
}

fn xml_tokens(src: &str) -> Vec<Token> {
    let mut buffer = BufferedVisitor::new();
    xml::parse(src, &mut buffer).expect("xml source should parse");
    buffer.into_tokens()
}

fn replay(tokens: &[Token], visitor: &mut impl TreeVisitor) {
    for token in tokens {
        token.replay(visitor);
    }
}

#[test]
fn both_syntaxes_produce_the_same_events() {
    let paren = paren_tokens(
        r#"(and is:List (not (isEmpty)) (apply (size) (equals (const "int" "3"))) (contains "a"))"#,
    );
    let xml = xml_tokens(
        r#"<and>
             <is:List/>
             <not><isEmpty/></not>
             <apply><size/><equals><const type="int" value="3"/></equals></apply>
             <contains>a</contains>
           </and>"#,
    );
    assert_eq!(paren, xml);
}

#[test]
fn paren_printer_layouts() {
    let tokens = paren_tokens(r#"(and is:String (equals "TE\"ST"))"#);

    let mut flat = ParenPrinter::new(false, false);
    replay(&tokens, &mut flat);
    assert_eq!(flat.finish(), r#"(and (is:String) (equals "TE\"ST"))"#);

    let mut pretty = ParenPrinter::new(true, false);
    replay(&tokens, &mut pretty);
    assert_eq!(pretty.finish(), "(and\n  (is:String)\n  (equals\n    \"TE\\\"ST\"))");
}

#[test]
fn printed_paren_reads_back() {
    let src = r#"(or (is:Null) (apply (length) (equals (const "int" "4"))) (startsWith "a\nb"))"#;
    let tokens = paren_tokens(src);
    for pretty in [false, true] {
        let mut printer = ParenPrinter::new(pretty, false);
        replay(&tokens, &mut printer);
        assert_eq!(paren_tokens(&printer.finish()), tokens);
    }
}

#[test]
fn printed_xml_reads_back() {
    let src = r#"(and (is:Not:Null) (not (equals "<a & b>")) (apply (length) (equals (const "int" "4"))))"#;
    let tokens = paren_tokens(src);
    for pretty in [false, true] {
        let mut printer = XmlPrinter::new(pretty, false);
        replay(&tokens, &mut printer);
        let printed = printer.finish();
        assert_eq!(xml_tokens(&printed), tokens, "reading back {printed}");
    }
}

#[test]
fn xml_printer_layout() {
    let tokens = paren_tokens(r#"(and (is:String) (equals "x"))"#);
    let mut printer = XmlPrinter::new(true, false);
    replay(&tokens, &mut printer);
    assert_eq!(
        printer.finish(),
        "<and>\n  <is:String/>\n  <equals>\n    <const value=\"x\"/>\n  </equals>\n</and>"
    );
}

#[test]
fn paren_errors_are_located() {
    let mut buffer = BufferedVisitor::new();
    let err = paren::parse("(and is:String (equals 12))", &mut buffer).unwrap_err();
    let hypred::Error::ParserErrors { errors } = &err else {
        panic!("expected a located error, got {err:?}");
    };
    assert_eq!(errors[0].start, 23);
    assert_eq!(errors[0].end, 25);
}

#[test]
fn xml_cdata_and_entities() {
    assert_eq!(
        xml_tokens("<equals><![CDATA[<raw> & text]]></equals>"),
        xml_tokens("<equals>&lt;raw&gt; &amp; text</equals>")
    );
    assert_eq!(
        xml_tokens("<equals>&#65;&#x42;</equals>"),
        vec![
            Token::Word("equals".into()),
            Token::Constant { ty: None, value: "AB".into() },
            Token::End,
            Token::EndOfTree,
        ]
    );
}
