use {
    crate::{
        ini::{Ini, IniError},
        op::{parse_op, Op, OpTokenError},
    },
    smallvec::SmallVec,
    std::{
        collections::HashSet,
        path::{Path, PathBuf},
    },
};

pub const MODEL_SECTION: &str = "model";
pub const CHAIN_OPTION: &str = "chain";
pub const OPS_SECTION: &str = "ops";

/// Ops of one link in declaration order.
pub type LinkOps = SmallVec<[Op; 4]>;

#[derive(Clone, Debug, PartialEq)]
pub struct LinkSpec {
    pub link: String,
    pub ops: LinkOps,
}

/// Links that have an ops entry, in chain order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedChain {
    links: Vec<LinkSpec>,
}

impl ParsedChain {
    pub fn new(links: Vec<LinkSpec>) -> Self {
        ParsedChain { links }
    }

    pub fn links(&self) -> &[LinkSpec] {
        &self.links
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinkSpec> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.iter().any(|spec| spec.link == link)
    }
}

impl<'a> IntoIterator for &'a ParsedChain {
    type Item = &'a LinkSpec;
    type IntoIter = std::slice::Iter<'a, LinkSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

/// Errors that make the chain description unusable.
#[derive(Debug, thiserror::Error)]
pub enum ChainSpecError {
    #[error("Failed to read chain description '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed chain description: {source}")]
    Ini {
        #[from]
        source: IniError,
    },

    #[error("No '[model]' section in chain description. Cannot continue")]
    MissingModel,

    #[error("No 'chain' option in '[model]' section. Cannot continue")]
    MissingChain,
}

/// Problems that are reported but do not stop parsing.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ChainSpecWarning {
    #[error("No '[ops]' section, input meshes will only be converted")]
    MissingOps,

    #[error("Link '{link}' is listed in the chain more than once")]
    DuplicateLink { link: String },

    #[error("Ignoring op '{token}' of link '{link}': {source}")]
    InvalidToken {
        link: String,
        token: String,
        source: OpTokenError,
    },
}

/// Parsed chain together with everything noticed on the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChainSpec {
    /// All link names from `[model] chain`, in order.
    pub chain: Vec<String>,
    pub parsed: ParsedChain,
    pub warnings: Vec<ChainSpecWarning>,
}

#[tracing::instrument]
pub fn load_chain_spec(path: &Path) -> Result<ChainSpec, ChainSpecError> {
    tracing::info!("Loading info from '{}'", path.display());
    let source =
        std::fs::read_to_string(path).map_err(|source| ChainSpecError::Io {
            path: path.to_owned(),
            source,
        })?;
    parse_chain_spec(&source)
}

pub fn parse_chain_spec(source: &str) -> Result<ChainSpec, ChainSpecError> {
    let ini = Ini::parse(source)?;

    if !ini.has_section(MODEL_SECTION) {
        return Err(ChainSpecError::MissingModel);
    }

    let mut spec = ChainSpec::default();

    if !ini.has_section(OPS_SECTION) {
        spec.warn(ChainSpecWarning::MissingOps);
        return Ok(spec);
    }

    let chain = ini
        .get(MODEL_SECTION, CHAIN_OPTION)
        .ok_or(ChainSpecError::MissingChain)?;

    let mut seen = HashSet::new();
    let mut model_links = Vec::new();
    for link in chain.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if !seen.insert(link) {
            spec.warn(ChainSpecWarning::DuplicateLink {
                link: link.to_owned(),
            });
            continue;
        }
        model_links.push(link.to_owned());
    }

    tracing::info!("{} links in model", model_links.len());

    let mut links = Vec::new();
    for link in &model_links {
        let op_string = match ini.get(OPS_SECTION, link) {
            Some(op_string) => op_string,
            None => continue,
        };

        if op_string.is_empty() {
            tracing::info!("No ops found for {}", link);
            continue;
        }

        let (ops, warnings) = parse_link_ops(link, op_string);
        for warning in warnings {
            spec.warn(warning);
        }
        links.push(LinkSpec {
            link: link.clone(),
            ops,
        });
    }

    spec.chain = model_links;
    spec.parsed = ParsedChain::new(links);
    Ok(spec)
}

/// Splits `;`-separated op string of one link.
///
/// Malformed tokens are dropped and reported, remaining tokens are still
/// collected.
pub fn parse_link_ops(
    link: &str,
    op_string: &str,
) -> (LinkOps, Vec<ChainSpecWarning>) {
    let tokens: Vec<&str> = op_string.split(';').map(str::trim).collect();
    tracing::info!("{} op(s) for '{}'", tokens.len(), link);

    let mut ops = LinkOps::new();
    let mut warnings = Vec::new();

    for token in tokens {
        match parse_op(token) {
            Ok(op) => ops.push(op),
            Err(source) => warnings.push(ChainSpecWarning::InvalidToken {
                link: link.to_owned(),
                token: token.to_owned(),
                source,
            }),
        }
    }

    (ops, warnings)
}

impl ChainSpec {
    fn warn(&mut self, warning: ChainSpecWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::op::Axis,
        pretty_assertions::assert_eq,
    };

    #[test]
    fn link_tokens_in_order() {
        let (ops, warnings) = parse_link_ops("a", "tx1.0;ry90.0");
        assert_eq!(
            &ops[..],
            &[Op::translate(Axis::X, 1.0), Op::rotate(Axis::Y, 90.0)][..]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn short_token_is_skipped() {
        let (ops, warnings) = parse_link_ops("a", "tz;tx1.0;ry2");
        assert_eq!(
            &ops[..],
            &[Op::translate(Axis::X, 1.0), Op::rotate(Axis::Y, 2.0)][..]
        );
        assert_eq!(
            warnings,
            vec![ChainSpecWarning::InvalidToken {
                link: "a".to_owned(),
                token: "tz".to_owned(),
                source: OpTokenError::TooShort { len: 2 },
            }]
        );
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let (ops, warnings) = parse_link_ops("a", "sx2.0;tz1");
        assert_eq!(&ops[..], &[Op::translate(Axis::Z, 1.0)][..]);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            ChainSpecWarning::InvalidToken {
                source: OpTokenError::UnknownOperator { code: 's' },
                ..
            }
        ));
    }

    #[test]
    fn links_without_ops_are_omitted() {
        let spec = parse_chain_spec(
            "[model]\nchain = A,B,C\n\n[ops]\nA = tx1.0\nB = ty2.0\n",
        )
        .unwrap();

        assert_eq!(spec.chain, vec!["A", "B", "C"]);
        assert_eq!(spec.parsed.len(), 2);
        assert_eq!(spec.parsed.links()[0].link, "A");
        assert_eq!(spec.parsed.links()[1].link, "B");
        assert!(!spec.parsed.contains("C"));
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn chain_order_wins_over_ops_order() {
        let spec = parse_chain_spec(
            "[model]\nchain = base, link1 ,link2\n[ops]\nlink2 = rz1\nlink1 = ry1\nbase = rx1\n",
        )
        .unwrap();
        let names: Vec<&str> =
            spec.parsed.iter().map(|spec| spec.link.as_str()).collect();
        assert_eq!(names, vec!["base", "link1", "link2"]);
    }

    #[test]
    fn empty_op_string_is_omitted() {
        let spec =
            parse_chain_spec("[model]\nchain = a,b\n[ops]\na =\nb = tx1\n")
                .unwrap();
        assert_eq!(spec.parsed.len(), 1);
        assert_eq!(spec.parsed.links()[0].link, "b");
    }

    #[test]
    fn duplicate_links_are_reported() {
        let spec =
            parse_chain_spec("[model]\nchain = a,b,a\n[ops]\na = tx1\n").unwrap();
        assert_eq!(spec.chain, vec!["a", "b"]);
        assert_eq!(
            spec.warnings,
            vec![ChainSpecWarning::DuplicateLink {
                link: "a".to_owned()
            }]
        );
    }

    #[test]
    fn missing_model_is_fatal() {
        let err = parse_chain_spec("[ops]\na = tx1\n").unwrap_err();
        assert!(matches!(err, ChainSpecError::MissingModel));
    }

    #[test]
    fn missing_chain_is_fatal() {
        let err = parse_chain_spec("[model]\n[ops]\na = tx1\n").unwrap_err();
        assert!(matches!(err, ChainSpecError::MissingChain));
    }

    #[test]
    fn missing_ops_yields_empty_chain() {
        let spec = parse_chain_spec("[model]\nchain = a,b\n").unwrap();
        assert!(spec.parsed.is_empty());
        assert_eq!(spec.warnings, vec![ChainSpecWarning::MissingOps]);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.ini");
        std::fs::write(&path, "[model]\nchain = base\n[ops]\nbase = tz0.5\n")
            .unwrap();

        let spec = load_chain_spec(&path).unwrap();
        assert_eq!(&spec.parsed.links()[0].ops[..], &[Op::translate(Axis::Z, 0.5)][..]);

        let err = load_chain_spec(&dir.path().join("missing.ini")).unwrap_err();
        assert!(matches!(err, ChainSpecError::Io { .. }));
    }
}
