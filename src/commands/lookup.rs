use crate::commands::Out;
use crate::model::{Field, ReferenceRecord};
use crate::{Config, Result};

/// Prints the catalog entry for `code`. An unknown code is not an error.
pub fn lookup(config: &Config, code: &str) -> Result<Out<Option<ReferenceRecord>>> {
    let catalog = config.load_catalog()?;
    let Some(record) = catalog.lookup(code) else {
        return Ok(Out::new(format!("No catalog entry for '{code}'"), None));
    };

    let names = config.headers();
    let mut lines = vec![format!("{}: {}", names.header(Field::MaterialCode), code)];
    if let Some(customs) = record.customs_code() {
        lines.push(format!("{}: {customs}", names.header(Field::CustomsCode)));
    }
    for field in Field::CERT {
        if let Some(value) = record.cert().get(field) {
            lines.push(format!("{}: {value}", names.header(field)));
        }
    }
    Ok(Out::new(lines.join("\n"), Some(record.clone())))
}
