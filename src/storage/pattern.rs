/// Section name pattern with `*` (any run) and `?` (one character) wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPattern {
    tokens: Vec<char>,
}

impl SectionPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            tokens: pattern.chars().collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.chars().collect::<Vec<_>>();
        let (mut p, mut n) = (0, 0);
        let mut backtrack: Option<(usize, usize)> = None;

        while n < name.len() {
            match self.tokens.get(p) {
                Some('*') => {
                    backtrack = Some((p, n));
                    p += 1;
                }
                Some('?') => {
                    p += 1;
                    n += 1;
                }
                Some(ch) if *ch == name[n] => {
                    p += 1;
                    n += 1;
                }
                _ => match backtrack {
                    Some((star, matched)) => {
                        p = star + 1;
                        n = matched + 1;
                        backtrack = Some((star, matched + 1));
                    }
                    None => return false,
                },
            }
        }

        self.tokens[p..].iter().all(|ch| *ch == '*')
    }
}
