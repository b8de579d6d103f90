//! Builds a [`SnapshotData`] from an optimum-intel checkout by scanning the
//! Python sources of its OpenVINO test-suite.
//!
//! Nothing is executed: class bodies are read as text, the
//! `SUPPORTED_ARCHITECTURES` declarations are collected together with the
//! `is_transformers_version(...)` conditions guarding them, and the result is
//! stored as an explicit task registry that can later be resolved for any
//! transformers version.

use crate::snapshot::{ArchitectureGroup, DiffusionPipeline, SnapshotData};
use crate::version::{Op, Requirement, VersionConstraint, VersionError};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Test modules scanned for architecture lists, in scan order.
pub const TEST_MODULES: [&str; 4] = [
    "test_seq2seq.py",
    "test_decoder.py",
    "test_modeling.py",
    "test_diffusion.py",
];
pub const TESTS_DIR: &str = "tests/openvino";
pub const DIFFUSION_MODULE: &str = "optimum/intel/openvino/modeling_diffusion.py";
pub const SETUP_FILE: &str = "setup.py";
pub const VERSION_FILE: &str = "optimum/intel/version.py";

const ARCH_ATTR: &str = "SUPPORTED_ARCHITECTURES";
const PIPELINES_ATTR: &str = "SUPPORTED_OV_PIPELINES";

static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^class\s+(\w+)\s*(?:\((.*)\))?\s*:").unwrap());
static TEST_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(OVModelFor.*IntegrationTest|OVPipelineFor.*Test)").unwrap());
static STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\\]*)"|'([^'\\]*)'"#).unwrap());
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_]\w*").unwrap());
static CONST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Z0-9_]+\b").unwrap());
static VERSION_CHECK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(not\s+)?is_transformers_version\(\s*["']([<>=!]+)["']\s*,\s*["']([^"']+)["']\s*\)"#,
    )
    .unwrap()
});
static AUTO_MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^auto_model_class\s*=\s*(\w+)").unwrap());
static DUNDER_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^__version__\s*=\s*["']([^"']+)["']"#).unwrap());

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No transformers requirement found in {0}")]
    MissingRequirement(PathBuf),

    #[error("No __version__ found in {0}")]
    MissingVersion(PathBuf),

    #[error("No test classes declaring SUPPORTED_ARCHITECTURES found under {0}")]
    NoTasks(PathBuf),

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// One logical Python line: comments stripped, bracketed continuations and
/// backslash continuations joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub indent: usize,
    pub text: String,
}

pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let chars: Vec<char> = source.chars().collect();
    let mut lines = Vec::new();
    let mut buf = String::new();
    let mut pending_indent = 0;
    let mut indent = 0;
    let mut depth = 0usize;
    let mut string: Option<(char, bool)> = None;
    let mut i = 0;

    fn flush(buf: &mut String, indent: usize, lines: &mut Vec<LogicalLine>) {
        let text = buf.trim();
        if !text.is_empty() {
            lines.push(LogicalLine {
                indent,
                text: text.to_string(),
            });
        }
        buf.clear();
    }

    while i < chars.len() {
        let c = chars[i];
        if let Some((quote, triple)) = string {
            match c {
                '\\' => {
                    buf.push(c);
                    if let Some(next) = chars.get(i + 1) {
                        buf.push(if *next == '\n' { ' ' } else { *next });
                    }
                    i += 2;
                    continue;
                }
                '\n' | '\r' => {
                    buf.push(' ');
                    if !triple {
                        string = None;
                    }
                }
                _ if c == quote => {
                    if !triple {
                        buf.push(c);
                        string = None;
                    } else if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                        buf.extend([quote; 3]);
                        string = None;
                        i += 3;
                        continue;
                    } else {
                        buf.push(c);
                    }
                }
                _ => buf.push(c),
            }
            i += 1;
            continue;
        }

        if buf.is_empty() && depth == 0 && (c == ' ' || c == '\t') {
            pending_indent += if c == '\t' { 4 } else { 1 };
            i += 1;
            continue;
        }

        match c {
            '\r' => {}
            '#' => {
                while i + 1 < chars.len() && chars[i + 1] != '\n' {
                    i += 1;
                }
            }
            '\n' => {
                if depth > 0 {
                    buf.push(' ');
                } else {
                    flush(&mut buf, indent, &mut lines);
                    pending_indent = 0;
                }
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                buf.push(' ');
                i += 1;
            }
            _ => {
                if buf.is_empty() && depth == 0 {
                    indent = pending_indent;
                }
                match c {
                    '"' | '\'' => {
                        let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                        if triple {
                            buf.extend([c; 3]);
                            i += 2;
                        } else {
                            buf.push(c);
                        }
                        string = Some((c, triple));
                    }
                    '(' | '[' | '{' => {
                        depth += 1;
                        buf.push(c);
                    }
                    ')' | ']' | '}' => {
                        depth = depth.saturating_sub(1);
                        buf.push(c);
                    }
                    _ => buf.push(c),
                }
            }
        }
        i += 1;
    }
    flush(&mut buf, indent, &mut lines);
    lines
}

/// String literal contents of an expression, in order.
pub fn string_literals(expr: &str) -> Vec<String> {
    STRING_RE
        .captures_iter(expr)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Transformers constraints implied by an `if` condition.
///
/// Checks on anything other than the transformers version are assumed to
/// hold. A condition joined with `or` cannot be expressed as a conjunction
/// and yields no constraint at all.
pub fn parse_condition(cond: &str) -> Vec<VersionConstraint> {
    if cond.split_whitespace().any(|w| w == "or") {
        return Vec::new();
    }
    VERSION_CHECK_RE
        .captures_iter(cond)
        .filter_map(|c| {
            let op: Op = c[2].parse().ok()?;
            let op = if c.get(1).is_some() { op.negate() } else { op };
            Some(VersionConstraint::new(op, c[3].parse().ok()?))
        })
        .collect()
}

/// `OVModelForCausalLMIntegrationTest` -> `OVModelForCausalLM`. Returns
/// `None` for classes outside the naming convention or for custom-task tests.
pub fn task_name(class_name: &str) -> Option<String> {
    if !TEST_CLASS_RE.is_match(class_name) {
        return None;
    }
    let task = class_name.replace("IntegrationTest", "").replace("Test", "");
    if task.contains("CustomTasks") {
        return None;
    }
    Some(task)
}

/// Architecture lists bound to a name, in declaration order.
type Scope = HashMap<String, Vec<ArchitectureGroup>>;

#[derive(Debug, Clone, Default)]
struct ClassDecl {
    bases: Vec<String>,
    groups: Option<Vec<ArchitectureGroup>>,
    auto_model_class: Option<Option<String>>,
    /// Other upper-case names assigned in the body, e.g. `SUPPORTED_SSM_ARCHITECTURES`.
    names: Scope,
}

enum Frame {
    Cond {
        indent: usize,
        when: Vec<VersionConstraint>,
    },
    Skip {
        indent: usize,
    },
}

impl Frame {
    fn indent(&self) -> usize {
        match self {
            Frame::Cond { indent, .. } | Frame::Skip { indent } => *indent,
        }
    }
}

fn block_header<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    text.strip_prefix(keyword)
        .filter(|rest| rest.starts_with([' ', '(', ':']))
        .and_then(|rest| rest.trim_end().strip_suffix(':'))
        .map(str::trim)
}

/// Constraints meaning "none of the earlier branches was taken". A branch
/// guarded by anything but a single transformers constraint cannot be
/// negated and is left out, which errs on the side of listing more.
fn earlier_branches_failed(branches: &[Vec<VersionConstraint>]) -> Vec<VersionConstraint> {
    branches
        .iter()
        .filter(|when| when.len() == 1)
        .map(|when| when[0].negate())
        .collect()
}

/// Names assigned at module level, outside any class or function.
fn module_scope(lines: &[LogicalLine]) -> Scope {
    scan_body(lines, &Scope::new()).names
}

/// Classes of a module with the architecture groups and `auto_model_class`
/// each declares in its own body.
fn scan_classes(lines: &[LogicalLine]) -> Vec<(String, ClassDecl)> {
    let module = module_scope(lines);
    let mut classes = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(caps) = CLASS_RE.captures(&lines[i].text) else {
            i += 1;
            continue;
        };
        let class_indent = lines[i].indent;
        let name = caps[1].to_string();
        let bases = caps
            .get(2)
            .map(|b| IDENT_RE.find_iter(b.as_str()).map(|m| m.as_str().to_string()).collect())
            .unwrap_or_default();
        let end = lines[i + 1..]
            .iter()
            .position(|l| l.indent <= class_indent)
            .map_or(lines.len(), |p| i + 1 + p);
        let mut decl = scan_body(&lines[i + 1..end], &module);
        decl.bases = bases;
        classes.push((name, decl));
        // nested classes are scanned too; they do not take part in the registry
        i += 1;
    }
    classes
}

fn scan_body(body: &[LogicalLine], module: &Scope) -> ClassDecl {
    let mut decl = ClassDecl::default();
    let Some(body_indent) = body.first().map(|l| l.indent) else {
        return decl;
    };
    let mut frames: Vec<Frame> = Vec::new();
    // conditions of the branches seen so far in the open if/elif chain, per indent
    let mut chains: HashMap<usize, Vec<Vec<VersionConstraint>>> = HashMap::new();

    for line in body {
        while frames.last().is_some_and(|f| line.indent <= f.indent()) {
            frames.pop();
        }
        let text = line.text.as_str();
        let continues_chain = text == "else:" || block_header(text, "elif").is_some();
        chains.retain(|indent, _| {
            *indent < line.indent || (*indent == line.indent && continues_chain)
        });

        if let Some(cond) = block_header(text, "if") {
            let when = parse_condition(cond);
            chains.insert(line.indent, vec![when.clone()]);
            frames.push(Frame::Cond {
                indent: line.indent,
                when,
            });
            continue;
        }
        if let Some(cond) = block_header(text, "elif") {
            let own = parse_condition(cond);
            let branches = chains.entry(line.indent).or_default();
            let mut when = earlier_branches_failed(branches.as_slice());
            when.extend(own.iter().cloned());
            branches.push(own);
            frames.push(Frame::Cond {
                indent: line.indent,
                when,
            });
            continue;
        }
        if text == "else:" {
            let when = chains
                .remove(&line.indent)
                .map(|branches| earlier_branches_failed(&branches))
                .unwrap_or_default();
            frames.push(Frame::Cond {
                indent: line.indent,
                when,
            });
            continue;
        }
        if text.starts_with("def ") || text.starts_with("async def ") || text.starts_with("class ") {
            frames.push(Frame::Skip {
                indent: line.indent,
            });
            continue;
        }
        if text.ends_with(':')
            && ["for ", "while ", "with ", "try", "except", "finally"]
                .iter()
                .any(|k| text.starts_with(k))
        {
            frames.push(Frame::Cond {
                indent: line.indent,
                when: Vec::new(),
            });
            continue;
        }
        if frames.iter().any(|f| matches!(f, Frame::Skip { .. })) {
            continue;
        }

        let when: Vec<VersionConstraint> = frames
            .iter()
            .flat_map(|f| match f {
                Frame::Cond { when, .. } => when.clone(),
                Frame::Skip { .. } => Vec::new(),
            })
            .collect();

        if line.indent == body_indent {
            if let Some(caps) = AUTO_MODEL_RE.captures(text) {
                let class = &caps[1];
                decl.auto_model_class = Some((class != "None").then(|| class.to_string()));
                continue;
            }
        }

        let Some(stmt) = list_statement(text) else {
            continue;
        };
        let added = resolve_list(&stmt, &when, &decl.names, module);
        let target = if stmt.target == ARCH_ATTR {
            decl.groups.get_or_insert_with(Vec::new)
        } else {
            decl.names.entry(stmt.target.to_string()).or_default()
        };
        if stmt.replaces && when.is_empty() {
            target.clear();
        }
        target.extend(added);
    }
    decl
}

/// An assignment to, or in-place extension of, an upper-case name.
struct ListStatement<'a> {
    target: &'a str,
    rhs: &'a str,
    replaces: bool,
}

fn list_statement(text: &str) -> Option<ListStatement<'_>> {
    let target = CONST_RE.find(text).filter(|m| m.start() == 0)?.as_str();
    let trimmed = text[target.len()..].trim_start();
    if let Some(rhs) = trimmed.strip_prefix("+=") {
        return Some(ListStatement {
            target,
            rhs,
            replaces: false,
        });
    }
    if let Some(call) = trimmed
        .strip_prefix(".extend(")
        .or_else(|| trimmed.strip_prefix(".append("))
    {
        return Some(ListStatement {
            target,
            rhs: call,
            replaces: false,
        });
    }
    let rhs = trimmed.strip_prefix('=')?;
    if rhs.starts_with('=') {
        return None;
    }
    let self_reference = CONST_RE.find_iter(rhs).any(|m| m.as_str() == target);
    Some(ListStatement {
        target,
        rhs,
        replaces: !self_reference,
    })
}

/// Groups contributed by the right-hand side of a list statement: its
/// string literals, then the lists of every other name it mentions, each
/// under the statement's own conditions.
fn resolve_list(
    stmt: &ListStatement<'_>,
    when: &[VersionConstraint],
    local: &Scope,
    module: &Scope,
) -> Vec<ArchitectureGroup> {
    let mut groups = Vec::new();
    let literals = string_literals(stmt.rhs);
    if !literals.is_empty() {
        groups.push(ArchitectureGroup {
            when: when.to_vec(),
            architectures: literals,
        });
    }

    let code = STRING_RE.replace_all(stmt.rhs, "\"\"");
    for name in CONST_RE.find_iter(&code).map(|m| m.as_str()) {
        if name == stmt.target {
            continue;
        }
        let Some(referenced) = local.get(name).or_else(|| module.get(name)) else {
            if stmt.target == ARCH_ATTR {
                log::warn!(
                    "{} refers to {}, which is not assigned in the scanned module; skipped",
                    ARCH_ATTR,
                    name
                );
            } else {
                log::debug!("{} refers to unknown name {}", stmt.target, name);
            }
            continue;
        };
        for group in referenced {
            let mut combined = when.to_vec();
            for constraint in &group.when {
                if !combined.contains(constraint) {
                    combined.push(constraint.clone());
                }
            }
            groups.push(ArchitectureGroup {
                when: combined,
                architectures: group.architectures.clone(),
            });
        }
    }
    groups
}

fn read(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Walk `name` and its base classes, first base first, until `get` finds
/// a declaration.
fn inherited<T>(
    name: &str,
    classes: &HashMap<String, ClassDecl>,
    get: impl Fn(&ClassDecl) -> Option<T>,
) -> Option<T> {
    let mut stack = vec![(name.to_string(), 0)];
    while let Some((current, depth)) = stack.pop() {
        let Some(decl) = classes.get(&current) else {
            continue;
        };
        if let Some(found) = get(decl) {
            return Some(found);
        }
        if depth < 16 {
            stack.extend(decl.bases.iter().rev().map(|b| (b.clone(), depth + 1)));
        }
    }
    None
}

/// Task registry of the given test module sources, each given as
/// `(module name, source)`.
pub fn extract_tasks(modules: &[(&str, &str)]) -> BTreeMap<String, Vec<ArchitectureGroup>> {
    let scanned: Vec<Vec<(String, ClassDecl)>> = modules
        .iter()
        .map(|(_, source)| scan_classes(&logical_lines(source)))
        .collect();
    let all: HashMap<String, ClassDecl> = scanned.iter().flatten().cloned().collect();

    let mut tasks = BTreeMap::new();
    for ((module, _), classes) in modules.iter().zip(&scanned) {
        // members in name order; a redefinition replaces the earlier class
        let members: BTreeMap<&String, &ClassDecl> =
            classes.iter().map(|(name, decl)| (name, decl)).collect();
        for (name, decl) in members {
            let Some(task) = task_name(name) else {
                continue;
            };
            let groups = decl.groups.clone().or_else(|| {
                decl.bases
                    .iter()
                    .find_map(|base| inherited(base, &all, |d| d.groups.clone()))
            });
            let Some(groups) = groups else {
                log::debug!("{module}: {name} declares no {ARCH_ATTR}, skipped");
                continue;
            };
            if tasks.insert(task.clone(), groups).is_some() {
                log::debug!("{module}: {name} overrides task {task}");
            }
        }
    }
    tasks
}

/// Pipelines listed in `SUPPORTED_OV_PIPELINES` with their resolved
/// `auto_model_class`.
pub fn extract_diffusion_pipelines(source: &str) -> Vec<DiffusionPipeline> {
    let lines = logical_lines(source);
    let classes: HashMap<String, ClassDecl> = scan_classes(&lines).into_iter().collect();

    let mut pipelines: Vec<String> = Vec::new();
    for line in &lines {
        let Some(rest) = line.text.strip_prefix(PIPELINES_ATTR) else {
            continue;
        };
        let rest = rest.trim_start();
        let expr = rest
            .strip_prefix("+=")
            .or_else(|| rest.strip_prefix(".extend("))
            .or_else(|| rest.strip_prefix(".append("))
            .or_else(|| rest.strip_prefix('=').filter(|r| !r.starts_with('=')));
        let Some(expr) = expr else {
            continue;
        };
        for ident in IDENT_RE.find_iter(expr).map(|m| m.as_str()) {
            if ident != PIPELINES_ATTR && !pipelines.iter().any(|p| p == ident) {
                pipelines.push(ident.to_string());
            }
        }
    }

    pipelines
        .into_iter()
        .map(|pipeline| {
            let auto_model_class =
                inherited(&pipeline, &classes, |d| d.auto_model_class.clone()).flatten();
            DiffusionPipeline {
                pipeline,
                auto_model_class,
            }
        })
        .collect()
}

/// The `transformers` entry of the install requirements in `setup.py`.
pub fn extract_transformers_requirement(setup_source: &str) -> Option<String> {
    logical_lines(setup_source)
        .iter()
        .filter(|l| {
            ["INSTALL_REQUIRE", "REQUIRED_PKGS", "install_requires"]
                .iter()
                .any(|k| l.text.starts_with(k))
        })
        .flat_map(|l| string_literals(&l.text))
        .find(|s| {
            !s.contains("extra")
                && s.parse::<Requirement>()
                    .is_ok_and(|r| r.name == "transformers")
        })
}

pub fn extract_version(version_source: &str) -> Option<String> {
    logical_lines(version_source)
        .iter()
        .find_map(|l| DUNDER_VERSION_RE.captures(&l.text).map(|c| c[1].to_string()))
}

/// Scan an optimum-intel checkout rooted at `root`.
pub fn ingest_checkout(root: &Path, source: &str) -> Result<SnapshotData, IngestError> {
    let tests_dir = root.join(TESTS_DIR);
    let mut sources = Vec::with_capacity(TEST_MODULES.len());
    for module in TEST_MODULES {
        sources.push((module, read(&tests_dir.join(module))?));
    }
    let modules: Vec<(&str, &str)> = sources.iter().map(|(m, s)| (*m, s.as_str())).collect();
    let tasks = extract_tasks(&modules);
    if tasks.is_empty() {
        return Err(IngestError::NoTasks(tests_dir));
    }

    let diffusion_pipelines = extract_diffusion_pipelines(&read(&root.join(DIFFUSION_MODULE))?);

    let setup_path = root.join(SETUP_FILE);
    let transformers_requirement = extract_transformers_requirement(&read(&setup_path)?)
        .ok_or(IngestError::MissingRequirement(setup_path))?;
    // fail early on a requirement the aggregator cannot use
    transformers_requirement.parse::<Requirement>()?.bounds()?;

    let version_path = root.join(VERSION_FILE);
    let optimum_intel_version =
        extract_version(&read(&version_path)?).ok_or(IngestError::MissingVersion(version_path))?;

    log::info!(
        "Ingested {} tasks and {} diffusion pipelines from {} (optimum-intel {})",
        tasks.len(),
        diffusion_pipelines.len(),
        root.display(),
        optimum_intel_version
    );

    Ok(SnapshotData {
        source: source.to_string(),
        optimum_intel_version,
        transformers_requirement,
        tasks,
        diffusion_pipelines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_lines_join_brackets_and_drop_comments() {
        let src = "class A:\n    X = (\n        \"a\",  # note\n        # \"b\",\n        'c',\n    )\n\n    y = 1 \\\n        + 2\n";
        let lines = logical_lines(src);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LogicalLine { indent: 0, text: "class A:".into() });
        assert_eq!(lines[1].indent, 4);
        assert_eq!(string_literals(&lines[1].text), vec!["a", "c"]);
        assert_eq!(lines[2].indent, 4);
        assert!(lines[2].text.starts_with("y = 1"));
    }

    #[test]
    fn test_logical_lines_skip_docstring_content() {
        let src = "def f():\n    \"\"\"Doc with ( and # inside\n    class Fake:\n    \"\"\"\n    return 1\n";
        let lines = logical_lines(src);
        assert_eq!(lines.len(), 3);
        assert!(!lines.iter().any(|l| l.text.starts_with("class")));
        assert_eq!(lines[2].text, "return 1");
    }

    #[test]
    fn test_task_name_normalization() {
        assert_eq!(
            task_name("OVModelForCausalLMIntegrationTest").as_deref(),
            Some("OVModelForCausalLM")
        );
        assert_eq!(
            task_name("OVPipelineForText2ImageTest").as_deref(),
            Some("OVPipelineForText2Image")
        );
        assert_eq!(task_name("OVModelForCustomTasksIntegrationTest"), None);
        assert_eq!(task_name("OVModelIntegrationTest"), None);
        assert_eq!(task_name("OVWeightCompressionTest"), None);
    }

    #[test]
    fn test_parse_condition() {
        let when = parse_condition(r#"is_transformers_version(">=", "4.46.0")"#);
        assert_eq!(when, vec![">=4.46.0".parse().unwrap()]);

        let when = parse_condition(
            r#"is_transformers_version(">=", "4.45") and is_openvino_version(">=", "2025.0") and is_transformers_version('<', '4.52')"#,
        );
        assert_eq!(when.len(), 2);

        let when = parse_condition(r#"not is_transformers_version("<", "4.50")"#);
        assert_eq!(when, vec![">=4.50".parse().unwrap()]);

        assert!(parse_condition(r#"platform.system() != "Windows""#).is_empty());
        assert!(
            parse_condition(r#"is_transformers_version("<", "4.40") or is_transformers_version(">=", "4.50")"#)
                .is_empty()
        );
    }

    #[test]
    fn test_extract_tasks_with_conditions() {
        let src = r#"
class OVModelForCausalLMIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = (
        "gpt2",
        "llama",
    )

    if is_transformers_version(">=", "4.46.0"):
        SUPPORTED_ARCHITECTURES += ("glm",)
        if is_transformers_version("<", "4.54"):
            SUPPORTED_ARCHITECTURES += ("nested",)
    else:
        SUPPORTED_ARCHITECTURES += ("old",)

    def test_compare(self):
        SUPPORTED_ARCHITECTURES = ("local",)

class OVModelForCustomTasksIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = ["custom"]
"#;
        let tasks = extract_tasks(&[("test_decoder.py", src)]);
        assert_eq!(tasks.len(), 1);
        let groups = &tasks["OVModelForCausalLM"];
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0], ArchitectureGroup::unconditional(vec!["gpt2".into(), "llama".into()]));
        assert_eq!(groups[1].when, vec![">=4.46.0".parse().unwrap()]);
        assert_eq!(
            groups[2].when,
            vec![">=4.46.0".parse().unwrap(), "<4.54".parse().unwrap()]
        );
        assert_eq!(groups[3].when, vec!["<4.46.0".parse().unwrap()]);
        assert_eq!(groups[3].architectures, vec!["old"]);
    }

    #[test]
    fn test_list_methods_and_inheritance() {
        let src = r#"
class OVPipelineForText2ImageTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = ["stable-diffusion"]
    if is_transformers_version(">=", "4.40.0"):
        SUPPORTED_ARCHITECTURES.extend(["flux", "sana"])
        SUPPORTED_ARCHITECTURES.append("sana-sprint")

class OVPipelineForImage2ImageTest(OVPipelineForText2ImageTest):
    pass
"#;
        let tasks = extract_tasks(&[("test_diffusion.py", src)]);
        assert_eq!(tasks.len(), 2);
        let groups = &tasks["OVPipelineForImage2Image"];
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].architectures, vec!["sana-sprint"]);
    }

    fn architectures_at(groups: &[ArchitectureGroup], version: &str) -> Vec<String> {
        let version = version.parse().unwrap();
        let mut archs: Vec<String> = groups
            .iter()
            .filter(|g| g.applies_to(&version))
            .flat_map(|g| g.architectures.iter().cloned())
            .collect();
        archs.sort();
        archs.dedup();
        archs
    }

    #[test]
    fn test_lists_referenced_by_name() {
        let src = r#"
BASE_ARCHITECTURES = ("bert",)
if is_transformers_version(">=", "4.50"):
    BASE_ARCHITECTURES += ("modernbert",)

class OVModelForCausalLMIntegrationTest(unittest.TestCase):
    SUPPORTED_SSM_ARCHITECTURES = ("mamba", "falcon-mamba")
    if is_transformers_version("<", "4.55"):
        SUPPORTED_SSM_ARCHITECTURES += ("zamba2",)

    SUPPORTED_ARCHITECTURES = ("gpt2",)
    if is_transformers_version(">=", "4.46"):
        SUPPORTED_ARCHITECTURES += SUPPORTED_SSM_ARCHITECTURES

class OVModelForFeatureExtractionIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = BASE_ARCHITECTURES + ("e5",) + IMPORTED_ARCHITECTURES
"#;
        let tasks = extract_tasks(&[("test_decoder.py", src)]);

        let causal = &tasks["OVModelForCausalLM"];
        assert_eq!(architectures_at(causal, "4.45"), vec!["gpt2"]);
        assert_eq!(
            architectures_at(causal, "4.50"),
            vec!["falcon-mamba", "gpt2", "mamba", "zamba2"]
        );
        assert_eq!(
            architectures_at(causal, "4.57"),
            vec!["falcon-mamba", "gpt2", "mamba"]
        );

        // unresolvable names contribute nothing; the rest of the list is kept
        let features = &tasks["OVModelForFeatureExtraction"];
        assert_eq!(architectures_at(features, "4.45"), vec!["bert", "e5"]);
        assert_eq!(
            architectures_at(features, "4.50"),
            vec!["bert", "e5", "modernbert"]
        );
    }

    #[test]
    fn test_if_elif_else_branches_are_exclusive() {
        let src = r#"
class OVModelForCausalLMIntegrationTest(unittest.TestCase):
    SUPPORTED_ARCHITECTURES = ("gpt2",)
    if is_transformers_version("<", "4.50"):
        SUPPORTED_ARCHITECTURES += ("a",)
    elif is_transformers_version("<", "4.55"):
        SUPPORTED_ARCHITECTURES += ("b",)
    else:
        SUPPORTED_ARCHITECTURES += ("c",)

    if is_openvino_version(">=", "2025.0"):
        SUPPORTED_ARCHITECTURES += ("d",)
    elif is_transformers_version(">=", "4.52"):
        SUPPORTED_ARCHITECTURES += ("e",)
    else:
        SUPPORTED_ARCHITECTURES += ("f",)
"#;
        let tasks = extract_tasks(&[("test_decoder.py", src)]);
        let groups = &tasks["OVModelForCausalLM"];

        assert_eq!(groups[2].when, vec![">=4.50".parse().unwrap(), "<4.55".parse().unwrap()]);
        assert_eq!(groups[3].when, vec![">=4.50".parse().unwrap(), ">=4.55".parse().unwrap()]);

        // the openvino branch cannot be negated, so the else only excludes the elif
        assert_eq!(architectures_at(groups, "4.45"), vec!["a", "d", "f", "gpt2"]);
        assert_eq!(architectures_at(groups, "4.52"), vec!["b", "d", "e", "gpt2"]);
        assert_eq!(architectures_at(groups, "4.57"), vec!["c", "d", "e", "gpt2"]);
    }

    #[test]
    fn test_same_task_name_overwrites() {
        let first = "class OVModelForMaskedLMIntegrationTest:\n    SUPPORTED_ARCHITECTURES = ('bert',)\n";
        let second = "class OVModelForMaskedLMIntegrationTest:\n    SUPPORTED_ARCHITECTURES = ('roberta',)\n";
        let tasks = extract_tasks(&[("a.py", first), ("b.py", second)]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks["OVModelForMaskedLM"][0].architectures, vec!["roberta"]);
    }

    #[test]
    fn test_extract_diffusion_pipelines() {
        let src = r#"
class OVDiffusionPipeline(OVBaseModel, DiffusionPipeline):
    auto_model_class = None

class OVStableDiffusionPipeline(OVDiffusionPipeline, StableDiffusionPipeline):
    main_input_name = "prompt"
    auto_model_class = StableDiffusionPipeline

    def __call__(self):
        auto_model_class = Wrong

class OVStableDiffusionImg2ImgPipeline(OVDiffusionPipeline):
    auto_model_class = StableDiffusionImg2ImgPipeline

class OVStableDiffusionXLPipeline(OVStableDiffusionPipeline):
    pass

SUPPORTED_OV_PIPELINES = [
    OVStableDiffusionPipeline,
    OVStableDiffusionImg2ImgPipeline,
]

if is_diffusers_version(">=", "0.29.0"):

    class OVStableDiffusion3Pipeline(OVDiffusionPipeline):
        auto_model_class = StableDiffusion3Pipeline

    SUPPORTED_OV_PIPELINES.extend([OVStableDiffusion3Pipeline])

SUPPORTED_OV_PIPELINES.append(OVStableDiffusionXLPipeline)
SUPPORTED_OV_PIPELINES.append(OVDiffusionPipeline)
"#;
        let pipelines = extract_diffusion_pipelines(src);
        let resolved: Vec<(&str, Option<&str>)> = pipelines
            .iter()
            .map(|p| (p.pipeline.as_str(), p.auto_model_class.as_deref()))
            .collect();
        assert_eq!(
            resolved,
            vec![
                ("OVStableDiffusionPipeline", Some("StableDiffusionPipeline")),
                ("OVStableDiffusionImg2ImgPipeline", Some("StableDiffusionImg2ImgPipeline")),
                ("OVStableDiffusion3Pipeline", Some("StableDiffusion3Pipeline")),
                ("OVStableDiffusionXLPipeline", Some("StableDiffusionPipeline")),
                ("OVDiffusionPipeline", None),
            ]
        );
    }

    #[test]
    fn test_extract_transformers_requirement() {
        let setup = r#"
INSTALL_REQUIRE = [
    "torch>=1.11",
    "optimum-onnx@git+https://github.com/huggingface/optimum-onnx.git",
    "transformers>=4.45,<4.57",
    "setuptools",
]

EXTRAS_REQUIRE = {
    "tests": ["transformers[testing]", "sentence-transformers"],
}
"#;
        assert_eq!(
            extract_transformers_requirement(setup).as_deref(),
            Some("transformers>=4.45,<4.57")
        );
        assert_eq!(extract_transformers_requirement("EXTRAS = ['transformers>=4']"), None);
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(
            extract_version("# Copyright\n__version__ = \"1.26.0.dev0\"\n").as_deref(),
            Some("1.26.0.dev0")
        );
        assert_eq!(extract_version("VERSION = 1"), None);
    }
}
