#![cfg(test)]
use std::convert::Infallible;

use crate::{
    builder::BnfParserBuilder,
    compiler::{CompileOptions, compile_rule},
    nodes::{ParseNode, ParseNodeVisitor},
    rule::Rule,
};
use display_tree::AsTree;
use proptest::prelude::*;

const NUM_NAMES: usize = 128;

/// `word0000` to `word0127`: all the same length, so no name is a prefix of another.
const NAMES: [&str; NUM_NAMES] = const {
    const NUM_LENGTH: usize = 4;
    const DIGITS: [u8; 10] = [b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9'];
    const PREFIX: &str = "word";

    const BYTE_BLOCKS: [[u8; PREFIX.len() + NUM_LENGTH]; NUM_NAMES] = {
        let mut orig = [[0; PREFIX.len() + NUM_LENGTH]; NUM_NAMES];
        let mut name_idx = 0;
        while name_idx < orig.len() {
            let mut i = 0;
            while i < PREFIX.len() {
                orig[name_idx][i] = PREFIX.as_bytes()[i];
                i += 1;
            }
            let mut digit = NUM_LENGTH;
            while digit > 0 {
                let shift = name_idx / (10usize.pow((digit - 1) as u32));
                orig[name_idx][PREFIX.len() + NUM_LENGTH - digit] = DIGITS[shift % DIGITS.len()];
                digit -= 1;
            }
            name_idx += 1;
        }
        orig
    };

    let mut output = [""; NUM_NAMES];
    let mut a = 0;
    while a < output.len() {
        output[a] = match str::from_utf8(&BYTE_BLOCKS[a]) {
            Ok(s) => s,
            Err(_) => unreachable!(),
        };
        a += 1;
    }
    output
};

/// A word of an alternative: terminal, non-terminal, or optional non-terminal.
fn word_strategy() -> impl Strategy<Value = String> {
    (0..NAMES.len() * 3).prop_map(|n| {
        let name = NAMES[n / 3];
        match n % 3 {
            0 => name.to_owned(),
            1 => format!("<{name}>"),
            2 => format!("<{name}>?"),
            _ => unreachable!(),
        }
    })
}

fn rule_line_strategy() -> impl Strategy<Value = String> {
    let alternative = prop::collection::vec(word_strategy(), 1..5).prop_map(|w| w.join(" "));
    prop_oneof![
        3 => prop::collection::vec(alternative, 1..5)
            .prop_map(|alts| format!("<r> := {}", alts.join(" | "))),
        1 => (0..NAMES.len()).prop_map(|n| format!("<r> := ^{}[0-9]*", NAMES[n])),
    ]
}

fn tree_strategy() -> impl Strategy<Value = ParseNode> {
    let leaf = (0..NAMES.len()).prop_map(|n| ParseNode::new(NAMES[n]));
    leaf.prop_recursive(4, 64, 5, |inner| {
        (0..NAMES.len(), prop::collection::vec(inner, 1..5)).prop_map(|(n, children)| {
            children
                .into_iter()
                .fold(ParseNode::rule(format!("<{}>", NAMES[n])), ParseNode::with_child)
        })
    })
}

/// Checks that visits and pops pair up like brackets.
#[derive(Default)]
struct Pairing {
    visits: usize,
    open: usize,
    unbalanced: bool,
}

impl ParseNodeVisitor for Pairing {
    type Error = Infallible;

    fn visit(&mut self, _: &ParseNode) -> Result<(), Infallible> {
        self.visits += 1;
        self.open += 1;
        Ok(())
    }

    fn pop(&mut self) {
        match self.open.checked_sub(1) {
            Some(open) => self.open = open,
            None => self.unbalanced = true,
        }
    }
}

#[test]
fn test_names() {
    assert_eq!(
        *NAMES.last().unwrap(),
        &format!("word{:04}", NAMES.len() - 1)
    );
}

proptest! {
    #[test]
    fn display_rule_roundtrip(line in rule_line_strategy()) {
        let rule = compile_rule(&line, CompileOptions::default()).unwrap_or_else(|e| panic!("{e}"));
        let shown = rule.to_string();
        let again = Rule::parse(&shown).unwrap_or_else(|e| panic!("{e}"));
        prop_assert_eq!(rule, again, "{} displayed as {}", line, shown);
    }

    #[test]
    fn optional_expansion_count(plain in 0usize..3, optional in 0usize..5) {
        let mut words: Vec<String> = (0..plain).map(|n| NAMES[n].to_owned()).collect();
        words.extend((0..optional).map(|n| format!("<{}>?", NAMES[n])));
        prop_assume!(!words.is_empty());

        let rule = Rule::parse(&format!("<r> := {}", words.join(" "))).unwrap();
        prop_assert_eq!(rule.alternatives().len(), 1 << optional);
    }

    #[test]
    fn traversals_visit_every_node_once(tree in tree_strategy()) {
        let mut prefix = Pairing::default();
        let mut postfix = Pairing::default();
        tree.prefix_accept(&mut prefix).unwrap();
        tree.postfix_accept(&mut postfix).unwrap();

        let shown = AsTree::new(&tree).to_string();
        prop_assert_eq!(prefix.visits, tree.size(), "{}", shown);
        prop_assert_eq!(postfix.visits, tree.size(), "{}", shown);
        prop_assert!(!prefix.unbalanced && prefix.open == 0);
        prop_assert!(!postfix.unbalanced && postfix.open == 0);
    }

    #[test]
    fn recompiled_grammar_parses_alike(input in prop::collection::vec(0usize..8, 1..20)) {
        let items: Vec<&str> = NAMES[..8].to_vec();
        let grammar = format!("<S> := <item> <S> | <item>\n<item> := {}", items.join(" | "));
        let sentence: Vec<&str> = input.iter().map(|&n| items[n]).collect();
        let sentence = sentence.join(" ");

        let first = BnfParserBuilder::new().add_grammar(&grammar).unwrap().build().unwrap();
        let second = BnfParserBuilder::new().add_grammar(&grammar).unwrap().build().unwrap();
        let shown = first.to_string();
        let third = BnfParserBuilder::new().add_grammar(&shown).unwrap().build().unwrap();

        let tree = first.parse(&sentence).unwrap();
        prop_assert_eq!(tree.size(), 3 * input.len());
        prop_assert_eq!(&second.parse(&sentence).unwrap(), &tree);
        prop_assert_eq!(&third.parse(&sentence).unwrap(), &tree);
    }
}
