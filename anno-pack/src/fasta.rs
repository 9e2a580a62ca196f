use config::open_table;
use hashbrown::{HashMap, HashSet};
use log::info;

use std::io::BufRead;
use std::path::Path;

const GENE_TAG: &str = "gene=";

/// identifiers of every sequence in the input proteome
#[derive(Debug, Clone, Default)]
pub struct GeneUniverse {
    pub ids: HashSet<String>,
    pub protein_to_gene: HashMap<String, String>,
}

impl GeneUniverse {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn locus(&self, protein: &str) -> Option<&str> {
        self.protein_to_gene.get(protein).map(|g| g.as_str())
    }
}

/// read sequence ids and `gene=` tags from FASTA headers
pub fn read_fasta<P: AsRef<Path>>(path: P) -> std::io::Result<GeneUniverse> {
    let reader = open_table(path.as_ref())?;
    let mut universe = GeneUniverse::default();

    for line in reader.lines() {
        let line = line?;
        let Some(header) = line.strip_prefix('>') else {
            continue;
        };

        let mut words = header.split_whitespace();
        let Some(id) = words.next() else {
            continue;
        };

        if let Some(gene) = words.find_map(|w| w.strip_prefix(GENE_TAG)) {
            if !gene.is_empty() {
                universe
                    .protein_to_gene
                    .insert(id.to_string(), gene.to_string());
            }
        }

        universe.ids.insert(id.to_string());
    }

    info!(
        "Sequences in {}: {} ({} mapped to a locus)",
        path.as_ref().display(),
        universe.len(),
        universe.protein_to_gene.len()
    );

    Ok(universe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_fasta_ids_and_loci() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            ">p1 gene=G1 len=120\nMKV\nLLA\n>p2 some protein\nMAA\n\
             >p3 gene=G1\nMKK\n>p1 duplicate\nM\n"
        )
        .unwrap();

        let universe = read_fasta(file.path()).unwrap();

        assert_eq!(universe.len(), 3);
        assert_eq!(universe.locus("p1"), Some("G1"));
        assert_eq!(universe.locus("p3"), Some("G1"));
        assert_eq!(universe.locus("p2"), None);
    }
}
