use anno_pack::{GeneAnnotationIndex, TermKind};
use config::{SourceTool, MAX_EXAMPLE_GENES};
use hashbrown::HashSet;
use log::warn;
use serde::Serialize;

use super::sets::{Combination, GeneSets, OverlapError, MAX_COMBINED_TOOLS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSize {
    pub tool: String,
    pub genes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueSet {
    pub tool: String,
    pub genes: usize,
    pub examples: Vec<String>,
}

impl UniqueSet {
    fn new(tool: &str, genes: HashSet<String>) -> Self {
        let mut examples = genes.iter().cloned().collect::<Vec<_>>();
        examples.sort_unstable();
        examples.truncate(MAX_EXAMPLE_GENES);

        Self {
            tool: tool.to_string(),
            genes: genes.len(),
            examples,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapSummary {
    pub tools: Vec<ToolSize>,
    pub union: usize,
    pub intersection: usize,
    pub combinations: Vec<Combination>,
    pub group: Vec<String>,
    pub group_union: usize,
    pub group_intersection: usize,
    pub unique: Vec<UniqueSet>,
    pub focus: Option<UniqueSet>,
}

/// one annotated-gene set per tool; both EggNOG generations share a set and
/// the ensemble contributes the genes surviving any model threshold
pub fn collect_sets(
    index: &GeneAnnotationIndex,
    tools: &[SourceTool],
    ensemble_genes: Option<&HashSet<String>>,
) -> GeneSets {
    let mut sets = GeneSets::new();

    for tool in tools {
        let genes = match (tool, ensemble_genes) {
            (SourceTool::Fantasia, Some(genes)) => genes.clone(),
            _ => index.genes_for(*tool, &TermKind::FUNCTIONAL),
        };

        sets.insert(tool.set_name(), genes);
    }

    sets
}

/// drop names without a set, warning once per name
fn present<'a>(sets: &GeneSets, names: &'a [String]) -> Vec<&'a str> {
    names
        .iter()
        .filter(|name| {
            let found = sets.contains(name);
            if !found {
                warn!("{} has no annotations in this run, skipped in overlaps", name);
            }
            found
        })
        .map(|name| name.as_str())
        .collect()
}

/// set statistics over every named tool, plus unique sets relative to
/// `group` and the genes only `focus` annotates
pub fn summarize(
    sets: &GeneSets,
    group: &[String],
    focus: Option<&str>,
) -> Result<OverlapSummary, OverlapError> {
    let all = sets.names().iter().map(|n| n.as_str()).collect::<Vec<_>>();
    let group = present(sets, group);

    let combined = if all.len() <= MAX_COMBINED_TOOLS {
        all.as_slice()
    } else {
        warn!(
            "{} tools exceed the combination limit, only the comparison group is combined",
            all.len()
        );
        group.as_slice()
    };

    let combinations = match sets.combinations(combined) {
        Ok(combinations) => combinations,
        Err(OverlapError::TooManyTools(n)) => {
            warn!("{} tools in the comparison group, combinations are skipped", n);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let tools = all
        .iter()
        .map(|tool| ToolSize {
            tool: tool.to_string(),
            genes: sets.get(tool).map_or(0, |s| s.len()),
        })
        .collect();

    let unique = group
        .iter()
        .map(|tool| Ok(UniqueSet::new(tool, sets.unique(tool, &group)?)))
        .collect::<Result<Vec<_>, OverlapError>>()?;

    let focus = match focus {
        Some(tool) if sets.contains(tool) => {
            let mut against = group.clone();
            against.push(tool);
            Some(UniqueSet::new(tool, sets.unique(tool, &against)?))
        }
        Some(tool) => {
            warn!("focus tool {} has no annotations in this run", tool);
            None
        }
        None => None,
    };

    Ok(OverlapSummary {
        tools,
        union: sets.union(&all)?.len(),
        intersection: sets.intersection(&all)?.len(),
        combinations,
        group: group.iter().map(|g| g.to_string()).collect(),
        group_union: sets.union(&group)?.len(),
        group_intersection: sets.intersection(&group)?.len(),
        unique,
        focus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_pack::{normalize, AnnotationFact};

    fn fact(gene: &str, term: &str, kind: TermKind, tool: SourceTool) -> AnnotationFact {
        AnnotationFact::new(gene, term, kind, tool, None, None).unwrap()
    }

    fn set(genes: &[&str]) -> HashSet<String> {
        genes.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_collect_sets_merges_eggnog_and_skips_domains() {
        let batch = normalize(vec![
            fact("g1", "K1", TermKind::Kegg, SourceTool::KofamScan),
            fact("g2", "IPR1", TermKind::Domain, SourceTool::InterProScan),
            fact("g3", "GO:1", TermKind::Go, SourceTool::InterProScan),
            fact("g4", "GO:1", TermKind::Go, SourceTool::EggNog),
            fact("g5", "K2", TermKind::Kegg, SourceTool::EggNog7),
        ]);

        let tools = [
            SourceTool::KofamScan,
            SourceTool::InterProScan,
            SourceTool::EggNog,
            SourceTool::EggNog7,
            SourceTool::Fantasia,
        ];
        let sets = collect_sets(&batch.index, &tools, Some(&set(&["g1", "g9"])));

        assert_eq!(sets.names(), ["kofamscan", "interproscan", "eggnog", "fantasia"]);
        assert_eq!(sets.get("interproscan").unwrap(), &set(&["g3"]));
        assert_eq!(sets.get("eggnog").unwrap(), &set(&["g4", "g5"]));
        assert_eq!(sets.get("fantasia").unwrap(), &set(&["g1", "g9"]));
    }

    #[test]
    fn test_summarize_group_and_focus() {
        let mut sets = GeneSets::new();
        sets.insert("kofamscan", set(&["1", "2", "3"]));
        sets.insert("interproscan", set(&["2", "3", "4"]));
        sets.insert("fantasia", set(&["3", "5", "6"]));

        let group = vec![
            "kofamscan".to_string(),
            "interproscan".to_string(),
            "eggnog".to_string(),
        ];
        let summary = summarize(&sets, &group, Some("fantasia")).unwrap();

        assert_eq!(summary.group, vec!["kofamscan", "interproscan"]);
        assert_eq!(summary.union, 6);
        assert_eq!(summary.intersection, 1);
        assert_eq!(summary.group_union, 4);
        assert_eq!(summary.group_intersection, 2);
        assert_eq!(summary.combinations.len(), 7);

        assert_eq!(summary.unique[0].examples, vec!["1"]);
        assert_eq!(summary.unique[1].examples, vec!["4"]);

        let focus = summary.focus.unwrap();
        assert_eq!(focus.genes, 2);
        assert_eq!(focus.examples, vec!["5", "6"]);
    }

    #[test]
    fn test_summarize_oversized_group_skips_combinations() {
        let mut sets = GeneSets::new();
        let group = (0..=MAX_COMBINED_TOOLS)
            .map(|i| {
                let name = format!("tool{}", i);
                sets.insert(&name, set(&["shared", name.as_str()]));
                name
            })
            .collect::<Vec<_>>();

        let summary = summarize(&sets, &group, None).unwrap();

        assert_eq!(summary.group.len(), MAX_COMBINED_TOOLS + 1);
        assert!(summary.combinations.is_empty());
        assert_eq!(summary.intersection, 1);
        assert_eq!(summary.group_union, MAX_COMBINED_TOOLS + 2);
        assert_eq!(summary.unique[0].examples, vec!["tool0"]);
    }
}
