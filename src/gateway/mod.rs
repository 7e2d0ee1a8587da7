pub mod catalog_cache;
