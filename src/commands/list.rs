//! Print stored recordings.

/// Prints every recording, most recent first.
///
/// # Errors
/// - If the configuration or the store cannot be read
pub fn handle_list() -> anyhow::Result<()> {
    let mut store = super::open_configured_store()?;
    let recordings = store.try_load()?;

    if recordings.is_empty() {
        println!("No recordings yet. Run 'voxmemo' to record one.");
        return Ok(());
    }

    println!("{:>3}  {:<15}  {:>5}  CREATED", "#", "ID", "TIME");
    for (index, recording) in recordings.iter().rev().enumerate() {
        println!(
            "{:>3}  {:<15}  {:>5}  {}",
            index + 1,
            recording.id,
            recording.duration_label,
            recording.created_at
        );
    }

    Ok(())
}
