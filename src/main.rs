use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use heapdb::catalog::{Record, RecordSchema};
use heapdb::common::types::{StorageConfig, TableId, DEFAULT_PAGE_SIZE};
use heapdb::query::executor::operators::{AggregateOp, AggregateOperator, GroupBy, Operator, PageScanOperator};
use heapdb::storage::disk::HeapFile;

#[derive(Parser)]
#[command(author, version, about = "HeapDB CLI - inspect and query slotted-page heap files")]
struct Cli {
    /// Page size in bytes
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Table id stamped on the pages of the file
    #[arg(short, long, default_value_t = 1)]
    table_id: u32,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a heap file of empty pages
    Create {
        file: PathBuf,
        /// Record schema, e.g. "id:int,name:string"
        #[arg(short, long)]
        schema: String,
        /// Number of empty pages to write
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Insert one record
    Insert {
        file: PathBuf,
        #[arg(short, long)]
        schema: String,
        /// Comma-separated field values
        #[arg(long)]
        values: String,
    },

    /// Print every stored record with its record id
    Dump {
        file: PathBuf,
        #[arg(short, long)]
        schema: String,
    },

    /// Compute an aggregate over the file, optionally grouped
    Aggregate {
        file: PathBuf,
        #[arg(short, long)]
        schema: String,
        /// count, sum, avg, min or max
        #[arg(long)]
        op: String,
        /// Field to aggregate
        #[arg(long)]
        field: String,
        /// Field to group by
        #[arg(long)]
        group_by: Option<String>,
    },

    /// Show the slot layout and bitmap of one page
    Inspect {
        file: PathBuf,
        #[arg(short, long)]
        schema: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
}

fn open_heap_file(cli: &Cli, file: &Path, schema: &str) -> Result<HeapFile> {
    let schema: RecordSchema = schema.parse().context("invalid --schema")?;
    let heap_file = HeapFile::open(
        file,
        TableId(cli.table_id),
        Arc::new(schema),
        StorageConfig::with_page_size(cli.page_size),
    )?;
    Ok(heap_file)
}

fn field_index(schema: &RecordSchema, name: &str) -> Result<usize> {
    schema
        .index_of(name)
        .ok_or_else(|| anyhow!("no field named '{}' in schema [{}]", name, schema))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Create { file, schema, pages } => {
            let heap_file = open_heap_file(&cli, file, schema)?;
            for _ in 0..*pages {
                heap_file.allocate_page()?;
            }
            println!("{} now holds {} pages", file.display(), heap_file.num_pages()?);
        }
        Commands::Insert { file, schema, values } => {
            let heap_file = open_heap_file(&cli, file, schema)?;
            let schema = heap_file.schema().clone();
            let literals: Vec<&str> = values.split(',').collect();
            if literals.len() != schema.num_fields() {
                return Err(anyhow!("expected {} values, got {}", schema.num_fields(), literals.len()));
            }
            let fields = schema
                .fields()
                .iter()
                .zip(literals)
                .map(|(def, literal)| def.field_type.parse_literal(literal))
                .collect::<Result<Vec<_>, _>>()?;
            let mut record = Record::new(schema, fields)?;
            let record_id = heap_file.insert_record(&mut record)?;
            println!("Inserted record at {}", record_id);
        }
        Commands::Dump { file, schema } => {
            let heap_file = open_heap_file(&cli, file, schema)?;
            for page in heap_file.read_all_pages()? {
                for record in &page {
                    let rid = record.record_id().map(|rid| rid.to_string()).unwrap_or_default();
                    println!("{}\t{}", rid, record);
                }
            }
        }
        Commands::Aggregate { file, schema, op, field, group_by } => {
            let heap_file = open_heap_file(&cli, file, schema)?;
            let schema = heap_file.schema().clone();
            let op: AggregateOp = op.parse()?;
            let aggregate_field = field_index(&schema, field)?;
            let group_by = match group_by {
                Some(name) => GroupBy::Field(field_index(&schema, name)?),
                None => GroupBy::NoGrouping,
            };

            let scan = PageScanOperator::new(schema, heap_file.read_all_pages()?);
            let mut aggregate = AggregateOperator::new(Box::new(scan), aggregate_field, group_by, op)?;

            let output_schema = aggregate.schema();
            let header: Vec<&str> = output_schema.fields().iter().map(|f| f.name.as_str()).collect();
            println!("{}", header.join("\t"));
            aggregate.open()?;
            while aggregate.has_next()? {
                println!("{}", aggregate.next()?);
            }
            aggregate.close()?;
        }
        Commands::Inspect { file, schema, page } => {
            let heap_file = open_heap_file(&cli, file, schema)?;
            let page = heap_file.read_page(*page)?;
            let layout = page.layout();
            println!("Page:          {}", page.page_id());
            println!("Record width:  {} bytes", layout.record_len);
            println!("Slots:         {}", layout.slot_count);
            println!("Used slots:    {}", layout.slot_count - page.empty_slot_count());
            println!("Header bytes:  {}", layout.header_len);
            println!("Bitmap:        {}", hex::encode(page.header_bytes()));
        }
    }

    Ok(())
}
