//! The `dictionary` command: show a dictionary file's definitions and
//! aliases as a console table.

use anyhow::Result;
use log::info;

use crate::{cli::DictionaryArgs, dictionary::Dictionary, pipeline, source::RecordSource, table};

pub fn execute(args: &DictionaryArgs) -> Result<()> {
    let mut source = pipeline::open_source(
        &args.dictionary,
        args.delimiter,
        Dictionary::new().into_shared(),
    )?;
    let dictionary = Dictionary::read_from(&mut source)?;
    source.close()?;

    let headers = ["Field", "Type", "Rule", "Append?", "Calculated"]
        .map(String::from)
        .to_vec();
    let mut rows: Vec<Vec<String>> = dictionary
        .defs()
        .iter()
        .map(|def| {
            vec![
                def.proper_name().to_string(),
                def.semantic().label().to_string(),
                def.rule().map(|rule| rule.name().to_string()).unwrap_or_default(),
                if def.combine_by_appending() { "yes" } else { "no" }.to_string(),
                def.calculated()
                    .map(|calc| calc.function.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    for alias in dictionary.aliases() {
        rows.push(vec![
            alias.alias.as_str().to_string(),
            format!("alias for {}", alias.original.as_str()),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    table::print_table(&headers, &rows);
    info!(
        "{} definition(s), {} alias(es)",
        dictionary.len(),
        dictionary.aliases().len()
    );
    Ok(())
}
