//! `clambda symbols`

pub fn execute() {
    for name in clambda_host::registry::names() {
        println!("{}", name);
    }
}
