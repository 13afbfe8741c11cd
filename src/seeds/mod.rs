pub mod sample_products_seed;
