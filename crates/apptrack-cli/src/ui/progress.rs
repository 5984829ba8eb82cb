//! Download progress formatting

/// Format a byte count with binary units.
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// Format download progress, with a percentage when the length is known.
pub fn format_download_progress(current: u64, total: Option<u64>) -> String {
    match total.filter(|&t| t > 0) {
        Some(total) => {
            let percent = (current.min(total) as f64 / total as f64) * 100.0;
            format!(
                "{} / {} ({percent:>3.0}%)",
                format_size(current),
                format_size(total)
            )
        }
        None => format_size(current),
    }
}
