fn main() {
    stable_fluids::start();
}
