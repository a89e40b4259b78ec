use colored::Colorize;
use mldeploy_client::{Bucket, CloudFunction, Object};
use prettytable::{format, row, Row, Table};
use serde::Serialize;

use anyhow::{anyhow, Context, Error, Result};
use std::{
    io::{self, Write},
    str::FromStr,
};

use crate::commands::deploy::model::ModelDeployment;

pub fn print_resources_as_json<Resource>(
    resources: impl IntoIterator<Item = Resource>,
    mut writer: impl Write,
) -> Result<()>
where
    Resource: Serialize,
{
    for resource in resources {
        serde_json::to_writer(&mut writer, &resource)
            .context("Could not serialise resource.")
            .and_then(|_| writeln!(writer).context("Failed to write JSON resource to writer."))?;
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        if string == "table" {
            Ok(OutputFormat::Table)
        } else if string == "json" {
            Ok(OutputFormat::Json)
        } else {
            Err(anyhow!("unknown output format `{}`", string))
        }
    }
}

/// Represents a resource that is able to be displayed as a table.
///
/// The implementation must implement `to_table_headers` to return headers for the resource type,
/// and `to_table_row`, which should return a data row for the given resource instance.
pub trait DisplayTable {
    fn to_table_headers() -> Row;

    fn to_table_row(&self) -> Row;
}

impl DisplayTable for Bucket {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "Location", "Storage Class", "Created (UTC)"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.name.0,
            self.location.as_deref().unwrap_or("unknown"),
            self.storage_class.as_deref().unwrap_or("unknown"),
            match &self.time_created {
                Some(time_created) => time_created.format("%Y-%m-%d %H:%M:%S").to_string().normal(),
                None => "unknown".dimmed(),
            }
        ]
    }
}

impl DisplayTable for Object {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "Bucket", "Size"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.name,
            self.bucket.dimmed(),
            self.size.as_deref().unwrap_or("unknown")
        ]
    }
}

impl DisplayTable for ModelDeployment {
    fn to_table_headers() -> Row {
        row![bFg => "Model", "Endpoint", "Endpoint ID", "Deployed Model ID"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.model.0,
            self.endpoint.0,
            self.endpoint_id.0,
            self.deployed_model_id
        ]
    }
}

impl DisplayTable for CloudFunction {
    fn to_table_headers() -> Row {
        row![bFg => "Name", "Runtime", "Entry Point", "Trigger", "Status"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.name.0,
            self.runtime,
            self.entry_point,
            self.event_trigger.resource,
            match &self.status {
                Some(status) => status.as_str().normal(),
                None => "unknown".dimmed(),
            }
        ]
    }
}

/// Helper trait to allow collection of resources to be converted into a table.
pub trait IntoTable {
    fn into_table(self) -> Table;
}

/// All iterators of resources can be converted into a table.
impl<'a, Iterable, Item: 'a> IntoTable for Iterable
where
    Iterable: IntoIterator<Item = &'a Item>,
    Item: DisplayTable,
{
    fn into_table(self) -> Table {
        let mut table = new_table();
        table.set_titles(Item::to_table_headers());
        for resource in self.into_iter() {
            table.add_row(resource.to_table_row());
        }
        table
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    let format = format::FormatBuilder::new()
        .column_separator(' ')
        .borders(' ')
        .separators(&[], format::LineSeparator::new('-', '+', '+', '+'))
        .padding(0, 1)
        .build();
    table.set_format(format);
    table
}

/// Print resources using the selected output format.
///
/// Resources passed to the printer must be able to be formatted using all supported
/// `OutputFormat`s.
#[derive(Default, Debug)]
pub struct Printer {
    output: OutputFormat,
}

impl Printer {
    pub fn new(output: OutputFormat) -> Self {
        Self { output }
    }

    pub fn print_resources<T, Resource>(&self, resources: T) -> Result<()>
    where
        T: IntoIterator<Item = Resource> + IntoTable,
        Resource: Serialize,
    {
        match self.output {
            OutputFormat::Table => resources.into_table().printstd(),
            OutputFormat::Json => print_resources_as_json(resources, io::stdout().lock())?,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!(matches!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table)));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_print_resources_as_json_writes_lines() {
        let buckets: Vec<Bucket> = serde_json::from_str(
            r#"[{"name": "model_bucket", "location": "US-CENTRAL1"}, {"name": "other_bucket"}]"#,
        )
        .unwrap();
        let mut output = Vec::new();
        print_resources_as_json(&buckets, &mut output).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""name":"model_bucket""#), "{}", lines[0]);
    }
}
