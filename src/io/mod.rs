//! Reading expression files and writing result files

pub mod load;
pub mod save;

pub use load::{load_dataset, read_dataset};
pub use save::{
    save_array_clusters, save_array_pca, save_array_som_nodes, save_cdt, save_gene_clusters,
    save_gene_pca, save_gene_som_nodes, save_tree,
};
