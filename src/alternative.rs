use std::{
    collections::HashSet,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    ops::Deref,
};

use crate::token::Token;

/// One case of a rule: an ordered sequence of tokens.
///
/// A try-last ("sticky") alternative is only attempted once every ordinary
/// alternative of its rule has failed. The flag takes no part in equality.
#[derive(Debug, Clone, Default)]
pub struct Alternative {
    tokens: Vec<Token>,
    try_last: bool,
}

impl Alternative {
    pub fn new(tokens: Vec<Token>) -> Alternative {
        Alternative {
            tokens,
            try_last: false,
        }
    }

    pub fn try_last(&self) -> bool {
        self.try_last
    }

    pub fn set_try_last(&mut self, try_last: bool) {
        self.try_last = try_last;
    }

    #[must_use]
    pub fn sticky(mut self) -> Alternative {
        self.try_last = true;
        self
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// All tokens of the alternative that are matched directly against input.
    pub fn terminal_tokens(&self) -> HashSet<&Token> {
        self.tokens.iter().filter(|t| t.is_terminal()).collect()
    }
}

impl Deref for Alternative {
    type Target = [Token];
    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

impl PartialEq for Alternative {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for Alternative {}

impl Hash for Alternative {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tokens.hash(state);
    }
}

impl FromIterator<Token> for Alternative {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Alternative::new(iter.into_iter().collect())
    }
}

impl Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, token) in self.tokens.iter().enumerate() {
            if n > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn equality_ignores_try_last() {
        let plain: Alternative = [Token::terminal("a"), Token::non_terminal("<b>")]
            .into_iter()
            .collect();
        let sticky = plain.clone().sticky();
        assert!(sticky.try_last());
        assert_eq!(plain, sticky);
    }

    #[test]
    fn order_matters() {
        let ab: Alternative = [Token::terminal("a"), Token::terminal("b")]
            .into_iter()
            .collect();
        let ba: Alternative = [Token::terminal("b"), Token::terminal("a")]
            .into_iter()
            .collect();
        assert_ne!(ab, ba);
    }

    #[test]
    fn display_joins_with_spaces() {
        let alt: Alternative = [Token::terminal("("), Token::non_terminal("<e>"), Token::terminal(")")]
            .into_iter()
            .collect();
        assert_eq!(alt.to_string(), "( <e> )");
        assert_eq!(alt.len(), 3);
        assert_eq!(alt.terminal_tokens().len(), 2);
    }
}
