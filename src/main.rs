fn main() {
    cluster_mst::cli::run();
}
