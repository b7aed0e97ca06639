//! CSV Run Tests
//!
//! Reference dataset and collection export on disk, through the pipeline, to
//! the output directory.

mod helpers;

use helpers::*;
use manatcg_resolve::build_catalog;
use manatcg_resolve::io::{create_output_dir, load_reference, read_collection, write_streams};
use manatcg_resolve::services::{BatchSurface, ReviewCoordinator};
use manatcg_resolve::workflow::Pipeline;
use tempfile::TempDir;

const REFERENCE: &str = "\
TCGplayer Id,Product Line,Set Name,Product Name,Title,Number,Rarity,Condition,TCG Market Price,TCG Direct Low,TCG Low Price With Shipping,TCG Low Price,Total Quantity,Add to Quantity,TCG Marketplace Price
100,Magic: The Gathering,Commander 2021,Sol Ring,,263,Uncommon,Near Mint,1.20,,,,0,,1.25
101,Magic: The Gathering,Commander 2021,Sol Ring (Prerelease),,263p,Uncommon,Near Mint,9.00,,,,0,,
200,Magic: The Gathering,Double Masters,Lightning Bolt,,117,Uncommon,Near Mint,2.00,,,,0,,
300,Magic: The Gathering,,Lost Row,,1,Common,Near Mint,,,,,0,,
";

const COLLECTION: &str = "\
Name,Set code,Set name,Collector number,Foil,Rarity,Quantity,ManaBox ID,Scryfall ID,Purchase price,Misprint,Altered,Condition,Language,Purchase price currency
Sol Ring,C21,Commander 2021,263,normal,uncommon,1,1,,0.80,false,false,near_mint,en,USD
Lightning Bolt,2XM,Double Masters,117,foil,uncommon,2,2,,,false,false,lightly_played,en,USD
Sol Ring,C21,Commander 2021,C21-263,normal,uncommon,3,3,,0.90,false,false,near_mint,en,USD
Mox Amber,DOM,Dominaria,224,normal,mythic,1,4,,,false,false,near_mint,en,USD
Black Lotus,LEA,Limited Edition Alpha,232,normal,rare,lots,5,,,false,false,near_mint,en,USD
";

#[tokio::test]
async fn test_collection_resolves_to_output_files() {
    // Given: both inputs on disk, prerelease filter on, no authority
    let dir = TempDir::new().unwrap();
    let reference_path = write_file(dir.path(), "reference.csv", REFERENCE);
    let collection_path = write_file(dir.path(), "collection.csv", COLLECTION);

    let mut config = offline_config();
    config.filters.exclude_prerelease = true;

    let reference = load_reference(&reference_path, &config.filters).unwrap();
    assert_eq!(reference.records.len(), 2);
    assert_eq!(reference.excluded, 1);
    assert_eq!(reference.missing_set, 1);

    let cat = build_catalog(reference.records, &config.aliases);
    let collection = read_collection(&collection_path).unwrap();
    assert_eq!(collection.rows.len(), 4);
    assert_eq!(collection.skipped, 1);

    // When: resolved with unattended review and written out
    let pipeline = Pipeline::new(&config, &cat, None);
    let output = pipeline
        .run(&collection.rows, ReviewCoordinator::new(Box::new(BatchSurface::AutoTop)))
        .await
        .unwrap();

    let now = chrono::Local::now();
    let out_dir = create_output_dir(dir.path(), &config.output.directory_prefix, now).unwrap();
    let files = write_streams(&out_dir, &output.main, &output.authority, &output.given_up).unwrap();

    // Then: Sol Ring merged, the foil Bolt confirmed through review, the
    // unknown card given up
    let main = std::fs::read_to_string(&files.main).unwrap();
    let lines: Vec<&str> = main.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "TCGplayer Id,Product Line,Set Name,Product Name,Number,Rarity,Condition,Add to Quantity,TCG Marketplace Price"
    );
    assert_eq!(lines[1], "100,Magic: The Gathering,Commander 2021,Sol Ring,263,Uncommon,Near Mint,4,0.80");
    assert_eq!(
        lines[2],
        "200,Magic: The Gathering,Double Masters,Lightning Bolt,117,Uncommon,Lightly Played Foil,2,0.10"
    );

    assert!(files.authority.is_none());
    let given_up = std::fs::read_to_string(files.given_up.as_ref().unwrap()).unwrap();
    assert!(given_up.contains("Not Found,Magic: The Gathering,Dominaria,Mox Amber,224,mythic,Near Mint,1,0.10"));

    assert_eq!(output.summary.auto_confirmed, 1);
    assert_eq!(output.summary.memo_hits, 1);
    assert_eq!(output.summary.review_confirmed, 1);
    assert!(out_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("converted_output_"));
}
