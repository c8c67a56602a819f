//! Streaming template mining based on longest common subsequences.
//!
//! Every cluster holds a token template. A new message joins the cluster it
//! shares the longest common subsequence with, provided that subsequence
//! covers at least `tau` of the message; the cluster template is then
//! narrowed to the common tokens with `<*>` standing in for the rest.

use super::{TemplateError, TemplateHandle, TemplateParser};
use regex::Regex;
use std::collections::HashSet;

pub const WILDCARD: &str = "<*>";

#[derive(Debug, Clone)]
struct LcsCluster {
    template: Vec<String>,
    key: String,
    size: usize,
}

impl LcsCluster {
    fn new(template: Vec<String>) -> Self {
        let key = template.join(" ");
        Self {
            template,
            key,
            size: 1,
        }
    }

    fn set_template(&mut self, template: Vec<String>) {
        self.key = template.join(" ");
        self.template = template;
    }
}

#[derive(Debug)]
pub struct SpellParser {
    tau: f64,
    preprocess: Vec<Regex>,
    delimiters: Regex,
    clusters: Vec<LcsCluster>,
}

impl SpellParser {
    /// Create a parser with similarity threshold `tau` and regexes whose
    /// matches are masked as `<*>` before tokenizing.
    pub fn new(tau: f64, preprocess: &[String]) -> Result<Self, TemplateError> {
        if !(tau > 0.0 && tau <= 1.0) {
            return Err(TemplateError::InvalidTau(tau));
        }

        let preprocess = preprocess
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| TemplateError::InvalidRegex {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tau,
            preprocess,
            delimiters: Regex::new(r"[\s=:,]").expect("static regex"),
            clusters: Vec::new(),
        })
    }

    fn tokenize(&self, message: &str) -> Vec<String> {
        let mut masked = message.to_string();
        for re in &self.preprocess {
            masked = re.replace_all(&masked, WILDCARD).into_owned();
        }
        self.delimiters
            .split(&masked)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Cheap pass: a template whose constant tokens all occur in the message.
    fn simple_loop_match(&self, constants: &[&str]) -> Option<usize> {
        let token_set: HashSet<&str> = constants.iter().copied().collect();

        self.clusters.iter().position(|cluster| {
            if (cluster.template.len() as f64) < 0.5 * constants.len() as f64 {
                return false;
            }
            cluster
                .template
                .iter()
                .all(|t| t == WILDCARD || token_set.contains(t.as_str()))
        })
    }

    fn lcs_match(&self, tokens: &[String]) -> Option<usize> {
        if tokens.is_empty() {
            return None;
        }

        let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let mut best: Option<(usize, usize)> = None; // (cluster, lcs length)

        for (idx, cluster) in self.clusters.iter().enumerate() {
            let template_set: HashSet<&str> = cluster.template.iter().map(String::as_str).collect();
            let overlap = token_set.intersection(&template_set).count();
            if (overlap as f64) < 0.5 * tokens.len() as f64 {
                continue;
            }

            let len = lcs(tokens, &cluster.template).len();
            let better = match best {
                None => true,
                Some((best_idx, best_len)) => {
                    len > best_len
                        || (len == best_len
                            && cluster.template.len() < self.clusters[best_idx].template.len())
                }
            };
            if better {
                best = Some((idx, len));
            }
        }

        best.filter(|(_, len)| *len as f64 >= self.tau * tokens.len() as f64)
            .map(|(idx, _)| idx)
    }
}

impl TemplateParser for SpellParser {
    fn observe(&mut self, message: &str) -> TemplateHandle {
        let tokens = self.tokenize(message);
        let constants: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| *t != WILDCARD)
            .collect();

        // A template already covered by the message stays as it is.
        if let Some(idx) = self.simple_loop_match(&constants) {
            self.clusters[idx].size += 1;
            return TemplateHandle(idx);
        }

        match self.lcs_match(&tokens) {
            Some(idx) => {
                let cluster = &mut self.clusters[idx];
                let common = lcs(&tokens, &cluster.template);
                let generalized = merge_template(&common, &cluster.template);
                if !generalized.is_empty() && generalized != cluster.template {
                    cluster.set_template(generalized);
                }
                cluster.size += 1;
                TemplateHandle(idx)
            }
            None => {
                self.clusters.push(LcsCluster::new(tokens));
                TemplateHandle(self.clusters.len() - 1)
            }
        }
    }

    fn template_key(&self, handle: TemplateHandle) -> &str {
        &self.clusters[handle.0].key
    }

    fn template_count(&self) -> usize {
        self.clusters.len()
    }
}

/// Longest common subsequence of two token sequences.
fn lcs(a: &[String], b: &[String]) -> Vec<String> {
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 0..a.len() {
        for j in 0..b.len() {
            table[i + 1][j + 1] = if a[i] == b[j] {
                table[i][j] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut result = Vec::with_capacity(table[a.len()][b.len()]);
    let (mut i, mut j) = (a.len(), b.len());
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            result.push(a[i - 1].clone());
            i -= 1;
            j -= 1;
        } else if table[i - 1][j] >= table[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    result.reverse();
    result
}

/// Rebuild `template` keeping the tokens of `common` in order and masking
/// everything else.
fn merge_template(common: &[String], template: &[String]) -> Vec<String> {
    if common.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(template.len());
    let mut remaining = common.iter().peekable();
    let mut consumed = 0;

    for token in template {
        consumed += 1;
        if remaining.peek() == Some(&token) {
            result.push(token.clone());
            remaining.next();
        } else {
            result.push(WILDCARD.to_string());
        }
        if remaining.peek().is_none() {
            break;
        }
    }
    if consumed < template.len() {
        result.push(WILDCARD.to_string());
    }
    result
}
