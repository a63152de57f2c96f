
use relation_ranker::Pipeline;

fn main() {
    Pipeline::run();
}
