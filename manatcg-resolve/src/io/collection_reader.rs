//! Collection export reading

use crate::error::{ResolveError, ResolveResult};
use crate::models::SourceRow;
use std::path::Path;
use tracing::{info, warn};

/// Collection rows that can be resolved
#[derive(Debug, Clone, Default)]
pub struct LoadedCollection {
    /// Rows in file order
    pub rows: Vec<SourceRow>,
    /// Rows skipped because they failed to parse or carry a bad quantity
    pub skipped: usize,
}

/// Read the collection export
pub fn read_collection(path: &Path) -> ResolveResult<LoadedCollection> {
    if !path.exists() {
        return Err(ResolveError::CollectionNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| ResolveError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut loaded = LoadedCollection::default();
    for (line, result) in reader.deserialize::<SourceRow>().enumerate() {
        match result {
            Ok(row) if row.quantity().is_some() => loaded.rows.push(row),
            Ok(row) => {
                warn!(
                    line = line + 2,
                    name = %row.name,
                    quantity = %row.quantity,
                    "Skipping collection row with invalid quantity"
                );
                loaded.skipped += 1;
            }
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping malformed collection row");
                loaded.skipped += 1;
            }
        }
    }

    info!(
        path = %path.display(),
        rows = loaded.rows.len(),
        skipped = loaded.skipped,
        "Collection export read"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reads_rows_and_skips_bad_quantity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collection.csv");
        fs::write(
            &path,
            "Name,Set code,Set name,Collector number,Foil,Rarity,Quantity,ManaBox ID,Scryfall ID,Purchase price,Misprint,Altered,Condition,Language,Purchase price currency\n\
             Sol Ring,C21,Commander 2021,263,normal,uncommon,2,1,abc,1.50,false,false,near_mint,en,USD\n\
             Lightning Bolt,2XM,Double Masters,117,foil,uncommon,many,2,,0.99,false,false,lightly_played,en,USD\n\
             Counterspell,MH2,Modern Horizons 2,267,normal,uncommon,,3,,,false,false,near_mint,en,USD\n",
        )
        .unwrap();

        let loaded = read_collection(&path).unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.skipped, 1);
        assert_eq!(loaded.rows[0].name, "Sol Ring");
        assert_eq!(loaded.rows[0].authority_id(), Some("abc"));
        assert_eq!(loaded.rows[1].quantity(), Some(1));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = read_collection(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(ResolveError::CollectionNotFound(_))));
    }
}
