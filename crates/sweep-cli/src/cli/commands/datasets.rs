use super::super::args::{DatasetsArgs, ExamplesArgs};
use crate::exit_codes::SUCCESS;
use sweep_core::dataset::{DatasetStore, PlusClient};

pub async fn cmd_datasets(args: DatasetsArgs) -> anyhow::Result<i32> {
    let client = PlusClient::from_env().await?;
    let datasets = client.list_datasets(args.limit).await?;
    if datasets.is_empty() {
        eprintln!("no datasets found");
    }
    for ds in datasets {
        println!(
            "{}\t{}\t{}",
            ds.id,
            ds.name,
            ds.description.as_deref().unwrap_or("")
        );
    }
    Ok(SUCCESS)
}

pub async fn cmd_examples(args: ExamplesArgs) -> anyhow::Result<i32> {
    let client = PlusClient::from_env().await?;
    let examples = client.list_examples(&args.dataset_id).await?;
    println!("{}", serde_json::to_string_pretty(&examples)?);
    Ok(SUCCESS)
}
