//! Collection grouping, run after a movie folder's walk.
//!
//! A collection is only materialised when at least two catalogued movies in
//! the same folder point at it; a lone member never creates one.

use std::collections::BTreeMap;

use homestream_common::{CollectionId, FolderId, ImageKind, MediaId};
use homestream_store::{CatalogRecord, CollectionRecord, StoredRecord};
use tracing::{error, info};

use super::{LibraryScanner, ScanContext};
use crate::images::cache::catalog_image_path;

/// Minimum number of movies sharing a collection id.
pub const MIN_COLLECTION_SIZE: usize = 2;

/// Movie ids keyed by the collection they belong to.
pub fn group_by_collection(
    records: &[StoredRecord<CatalogRecord>],
) -> BTreeMap<CollectionId, Vec<MediaId>> {
    let mut groups: BTreeMap<CollectionId, Vec<MediaId>> = BTreeMap::new();
    for entry in records {
        if let Some(movie) = entry.record.as_movie() {
            if let Some(collection) = movie.metadata.collection_id {
                groups.entry(collection).or_default().push(movie.id);
            }
        }
    }
    groups
}

impl LibraryScanner {
    pub(crate) async fn group_collections(&self, folder: FolderId, ctx: &mut ScanContext) {
        let records = self.store.list(folder);

        for (collection_id, members) in group_by_collection(&records) {
            if members.len() < MIN_COLLECTION_SIZE {
                continue;
            }

            let collection = match self.store.get_collection(collection_id) {
                Some(existing) => existing,
                None => {
                    let Some(fetched) = self.provider.collection_details(collection_id).await else {
                        info!(
                            collection = %collection_id,
                            "Provider has no details for collection"
                        );
                        continue;
                    };
                    if let Err(e) = self.store.put_collection(&fetched) {
                        error!(
                            collection = %collection_id,
                            error = %e,
                            "Failed to record collection"
                        );
                        continue;
                    }
                    info!(
                        collection = %collection_id,
                        name = %fetched.name,
                        movies = members.len(),
                        "Created collection"
                    );
                    ctx.report.collections_created += 1;
                    fetched
                }
            };

            self.queue_collection_images(&collection, ctx);
        }
    }

    fn queue_collection_images(&self, collection: &CollectionRecord, ctx: &mut ScanContext) {
        let dir = self.store.layout().collection_dir(collection.id);
        self.queue_image(
            &mut ctx.jobs,
            collection.images.backdrop_path.as_deref(),
            catalog_image_path(&dir, ImageKind::Backdrop),
        );
        self.queue_image(
            &mut ctx.jobs,
            collection.images.poster_path.as_deref(),
            catalog_image_path(&dir, ImageKind::Poster),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use homestream_store::{MovieMetadata, MovieRecord, ShowMetadata, TvShowRecord};
    use std::path::PathBuf;

    fn movie(id: u64, collection: Option<u64>) -> StoredRecord<CatalogRecord> {
        StoredRecord {
            path: PathBuf::from(format!("/data/libraries/1/{id}")),
            record: CatalogRecord::Movie(MovieRecord {
                id: MediaId::from(id),
                path: PathBuf::from(format!("/m/{id}.mkv")),
                metadata: MovieMetadata {
                    title: format!("Movie {id}"),
                    collection_id: collection.map(CollectionId::from),
                    ..Default::default()
                },
                added_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn groups_movies_by_collection() {
        let records = vec![
            movie(1, Some(10)),
            movie(2, Some(10)),
            movie(3, Some(99)),
            movie(4, None),
        ];
        let groups = group_by_collection(&records);

        assert_eq!(
            groups.get(&CollectionId::from(10)),
            Some(&vec![MediaId::from(1), MediaId::from(2)])
        );
        assert_eq!(groups.get(&CollectionId::from(99)).map(Vec::len), Some(1));
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn shows_are_ignored() {
        let records = vec![StoredRecord {
            path: PathBuf::from("/data/libraries/1/5"),
            record: CatalogRecord::TvShow(TvShowRecord {
                id: MediaId::from(5),
                root_path: None,
                metadata: ShowMetadata::default(),
            }),
        }];
        assert!(group_by_collection(&records).is_empty());
    }
}
