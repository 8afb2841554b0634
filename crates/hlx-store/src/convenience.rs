//! Thin wrappers packing a single string, string list, or byte array into a
//! snapshot without a caller-defined type.

use std::path::Path;

use crate::api::{load_or_new, save, SaveOptions};
use crate::error::StoreResult;

pub fn save_string(value: &str, path: &Path, options: SaveOptions) -> StoreResult<()> {
    save(&value.to_owned(), path, options)
}

pub fn load_string_or(path: &Path, portable: bool) -> String {
    load_or_new::<String>(path, portable)
}

pub fn save_string_list(values: &[String], path: &Path, options: SaveOptions) -> StoreResult<()> {
    save(&values.to_vec(), path, options)
}

pub fn load_string_list_or(path: &Path, portable: bool) -> Vec<String> {
    load_or_new::<Vec<String>>(path, portable)
}

pub fn save_bytes(bytes: &[u8], path: &Path, options: SaveOptions) -> StoreResult<()> {
    save(&bytes.to_vec(), path, options)
}

pub fn load_bytes_or(path: &Path, portable: bool) -> Vec<u8> {
    load_or_new::<Vec<u8>>(path, portable)
}
