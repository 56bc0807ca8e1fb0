//! DOM helpers: reading picked files and triggering downloads.

use crate::error::{AppError, AppResult};
use crate::gateway::DatasetFile;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

pub async fn read_file(file: &web_sys::File) -> AppResult<DatasetFile> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| AppError::browser(format!("could not read '{}'", file.name())))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(DatasetFile::new(file.name(), file.type_(), bytes))
}

pub async fn read_file_list(list: Option<web_sys::FileList>) -> AppResult<Vec<DatasetFile>> {
    let Some(list) = list else {
        return Ok(Vec::new());
    };
    let mut files = Vec::with_capacity(list.length() as usize);
    for idx in 0..list.length() {
        if let Some(file) = list.get(idx) {
            files.push(read_file(&file).await?);
        }
    }
    Ok(files)
}

/// Saves `bytes` as `filename` through a temporary object URL.
pub fn download_bytes(filename: &str, bytes: &[u8], mime: &str) -> AppResult<()> {
    let document = gloo_utils::document();

    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|_| AppError::browser("could not create the download blob"))?;

    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|_| AppError::browser("could not create an object URL"))?;

    let anchor = document
        .create_element("a")
        .map_err(|_| AppError::browser("could not create a download link"))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| AppError::browser("download link is not an anchor"))?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    let _ = web_sys::Url::revoke_object_url(&url);
    Ok(())
}
